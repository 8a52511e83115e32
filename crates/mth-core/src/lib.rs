//! Hierarchical magnetotelluric survey archives.
//!
//! An archive is a tree of entity nodes inside a hierarchical container:
//!
//! ```text
//! Survey
//! ├── Stations ── Station ── Run ── Channel
//! ├── Standards
//! ├── Filters
//! └── Reports
//! ```
//!
//! Every node carries schema-validated metadata as attributes. Group nodes
//! keep a `Summary` table with one row per child, updated as children are
//! added and removed.
//!
//! ```no_run
//! use mth_core::{Archive, MemContainer};
//!
//! # fn main() -> mth_core::Result<()> {
//! let archive = Archive::with_defaults(MemContainer::new())?;
//! let stations = archive.stations()?;
//! let (station, _) = stations.add_station("MT001", None)?;
//! let (run, _) = station.add_run(&station.next_run_name()?, None)?;
//! println!("{}", archive.tree()?);
//! # let _ = run;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod container;
pub mod entity;
pub mod logging;
pub mod node;
pub mod profile;
mod rows;

pub use archive::Archive;
pub use config::{resolve_config, ArchiveConfig, Capacities, ConfigSource, ResolvedConfig};
pub use container::{ContainerBackend, DatasetStorage, MemContainer, NodeKind};
pub use entity::{Channel, Filters, Reports, Run, Standards, Station, Stations, Survey};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use node::EntityNode;
pub use profile::{KindProfile, Profiles};

pub use mth_common::{ChannelKind, EntityKind, Error, ReferenceHandle, Result};
pub use mth_metadata::MetadataRecord;
