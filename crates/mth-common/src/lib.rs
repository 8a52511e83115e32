//! Shared types for mth archives.
//!
//! This crate provides the foundational pieces every other mth crate uses:
//! - The error taxonomy and structured error reporting
//! - Entity kinds and channel kinds of the survey hierarchy
//! - Opaque reference handles to container nodes
//! - Date/time parsing and canonical normalization

pub mod error;
pub mod kind;
pub mod reference;
pub mod time;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use kind::{ChannelKind, EntityKind};
pub use reference::ReferenceHandle;
