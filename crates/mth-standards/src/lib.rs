//! Attribute schema for mth archives.
//!
//! The standards catalogue describes every attribute an entity may carry:
//! its value type, whether it is required, its style, units, allowed options
//! and aliases. The catalogue ships embedded in the crate and is loaded once
//! into a read-only [`SchemaRegistry`].

pub mod registry;
pub mod rule;
pub mod summary;

pub use mth_common::{Error, Result};
pub use registry::{SchemaRegistry, SchemaSet, SECTIONS};
pub use rule::{SchemaRule, Style, ValueType};
pub use summary::RuleSummary;
