//! Summary table storage backed by a container record dataset.

use chrono::Utc;
use mth_common::time::format_canonical;
use mth_common::{ReferenceHandle, Result};
use mth_table::{Cell, RecordLayout, TableStorage};
use serde_json::Value;
use std::sync::Arc;

use super::ContainerBackend;

/// Attribute recording the last mutation of a summary dataset.
pub const LAST_UPDATED_ATTR: &str = "last_updated";

/// A record dataset viewed as [`TableStorage`].
///
/// Borrows the container; it never owns the dataset's storage.
pub struct DatasetStorage<'c, C: ContainerBackend> {
    container: &'c C,
    node: ReferenceHandle,
}

impl<'c, C: ContainerBackend> DatasetStorage<'c, C> {
    pub fn new(container: &'c C, node: ReferenceHandle) -> Self {
        Self { container, node }
    }

    pub fn handle(&self) -> ReferenceHandle {
        self.node
    }
}

impl<C: ContainerBackend> TableStorage for DatasetStorage<'_, C> {
    fn layout(&self) -> Result<Arc<RecordLayout>> {
        self.container.table_layout(self.node)
    }

    fn len(&self) -> Result<usize> {
        self.container.table_len(self.node)
    }

    fn max_len(&self) -> Result<usize> {
        self.container.table_max_len(self.node)
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        self.container.table_resize(self.node, len)
    }

    fn read_row(&self, index: usize) -> Result<Vec<Cell>> {
        self.container.read_row(self.node, index)
    }

    fn write_row(&mut self, index: usize, cells: Vec<Cell>) -> Result<()> {
        self.container.write_row(self.node, index, cells)
    }

    fn touch(&mut self) -> Result<()> {
        self.container.set_attr(
            self.node,
            LAST_UPDATED_ATTR,
            Value::String(format_canonical(&Utc::now())),
        )
    }
}
