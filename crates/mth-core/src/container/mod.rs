//! The hierarchical container the archive lives in.
//!
//! The container is an external collaborator: it stores named groups, fixed
//! layout record datasets and resizable sample datasets, each carrying named
//! attributes and addressed by a stable [`ReferenceHandle`]. Nothing in this
//! crate performs disk I/O; persistence belongs to the backend.
//!
//! Handles stay valid for the container's lifetime. Unlinking a node removes
//! it from its parent's listing without reclaiming its storage. After
//! [`ContainerBackend::close`], every operation fails with `ClosedResource`.

pub mod dataset;
pub mod memory;

pub use dataset::DatasetStorage;
pub use memory::MemContainer;

use mth_common::{ReferenceHandle, Result};
use mth_table::{Cell, RecordLayout};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What a container node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    /// Fixed-layout record dataset (summary tables).
    Table,
    /// Resizable numeric dataset (channel samples).
    Samples,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group => write!(f, "group"),
            NodeKind::Table => write!(f, "table"),
            NodeKind::Samples => write!(f, "samples"),
        }
    }
}

/// Operations the archive needs from a hierarchical container library.
///
/// Methods take `&self`: a container handle is shared by every node view
/// over it, and backends manage their own interior state. Access is
/// single-threaded.
pub trait ContainerBackend {
    fn is_open(&self) -> bool;

    /// Invalidate the handle. Idempotent.
    fn close(&self);

    /// Handle of the root group.
    fn root(&self) -> Result<ReferenceHandle>;

    fn create_group(&self, parent: ReferenceHandle, name: &str) -> Result<ReferenceHandle>;

    fn create_table(
        &self,
        parent: ReferenceHandle,
        name: &str,
        layout: &RecordLayout,
        max_len: usize,
    ) -> Result<ReferenceHandle>;

    fn create_samples(&self, parent: ReferenceHandle, name: &str) -> Result<ReferenceHandle>;

    /// Handle of the child `name` of `parent`, if linked.
    fn child(&self, parent: ReferenceHandle, name: &str) -> Result<Option<ReferenceHandle>>;

    /// Names of linked children in creation order.
    fn children(&self, parent: ReferenceHandle) -> Result<Vec<String>>;

    /// Remove the link `name` from `parent`. Storage is not reclaimed.
    fn unlink(&self, parent: ReferenceHandle, name: &str) -> Result<()>;

    fn node_kind(&self, node: ReferenceHandle) -> Result<NodeKind>;

    fn attrs(&self, node: ReferenceHandle) -> Result<BTreeMap<String, Value>>;

    fn set_attr(&self, node: ReferenceHandle, name: &str, value: Value) -> Result<()>;

    fn delete_attr(&self, node: ReferenceHandle, name: &str) -> Result<()>;

    fn table_layout(&self, node: ReferenceHandle) -> Result<Arc<RecordLayout>>;

    fn table_len(&self, node: ReferenceHandle) -> Result<usize>;

    fn table_max_len(&self, node: ReferenceHandle) -> Result<usize>;

    fn table_resize(&self, node: ReferenceHandle, len: usize) -> Result<()>;

    fn read_row(&self, node: ReferenceHandle, index: usize) -> Result<Vec<Cell>>;

    fn write_row(&self, node: ReferenceHandle, index: usize, cells: Vec<Cell>) -> Result<()>;

    fn sample_count(&self, node: ReferenceHandle) -> Result<usize>;

    fn read_samples(&self, node: ReferenceHandle) -> Result<Vec<f64>>;

    /// Replace the samples of `node`.
    fn write_samples(&self, node: ReferenceHandle, samples: &[f64]) -> Result<()>;
}
