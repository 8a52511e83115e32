//! Summary tables for mth archives.
//!
//! A summary table is a fixed-layout, append-mostly table of fixed-width
//! records stored next to a node's children. The backing medium can only
//! append and resize, so rows are never compacted: removal overwrites a row
//! with an all-empty tombstone and every other index stays stable.
//!
//! Layers:
//! - [`layout`]: field names and fixed-width types
//! - [`cell`]: cell values and whole records
//! - [`storage`]: the [`TableStorage`] medium trait and an in-memory medium
//! - [`table`]: the [`SummaryTable`] engine (append, locate, tombstone)
//! - [`schema`]: per-entity-kind layouts and default capacities

pub mod cell;
pub mod layout;
pub mod predicate;
pub mod schema;
pub mod storage;
pub mod table;

pub use cell::{truncate_to_width, Cell, Record};
pub use layout::{Field, FieldType, RecordLayout};
pub use mth_common::{Error, Result};
pub use predicate::{Probe, Test};
pub use schema::{default_capacity, layout_for, SUMMARY_NAME};
pub use storage::{MemTableStorage, TableStorage};
pub use table::{RowState, SummaryTable};
