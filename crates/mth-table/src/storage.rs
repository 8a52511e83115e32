//! The medium a summary table is stored in.

use mth_common::{Error, Result};
use std::sync::Arc;

use crate::cell::Cell;
use crate::layout::RecordLayout;

/// Append/resize-only row storage.
///
/// The medium holds a fixed layout chosen at creation and a resizable row
/// count bounded by `max_len`. Rows can be read and overwritten in place but
/// never removed.
pub trait TableStorage {
    /// Layout the storage was created with.
    fn layout(&self) -> Result<Arc<RecordLayout>>;

    /// Number of allocated rows.
    fn len(&self) -> Result<usize>;

    /// Hard upper bound on the row count.
    fn max_len(&self) -> Result<usize>;

    /// Grow (or shrink) to `len` rows; new rows are empty.
    fn resize(&mut self, len: usize) -> Result<()>;

    fn read_row(&self, index: usize) -> Result<Vec<Cell>>;

    fn write_row(&mut self, index: usize, cells: Vec<Cell>) -> Result<()>;

    /// Called after every mutation; media with timestamps record it here.
    fn touch(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Storage held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemTableStorage {
    layout: Arc<RecordLayout>,
    rows: Vec<Vec<Cell>>,
    max_len: usize,
}

impl MemTableStorage {
    pub fn new(layout: RecordLayout, max_len: usize) -> Self {
        Self {
            layout: Arc::new(layout),
            rows: Vec::new(),
            max_len,
        }
    }
}

impl TableStorage for MemTableStorage {
    fn layout(&self) -> Result<Arc<RecordLayout>> {
        Ok(self.layout.clone())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn max_len(&self) -> Result<usize> {
        Ok(self.max_len)
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        if len > self.max_len {
            return Err(Error::CapacityExceeded {
                table: "memory".to_string(),
                capacity: self.max_len,
            });
        }
        let empty: Vec<Cell> = self
            .layout
            .fields()
            .iter()
            .map(|field| Cell::empty(field.field_type))
            .collect();
        self.rows.resize(len, empty);
        Ok(())
    }

    fn read_row(&self, index: usize) -> Result<Vec<Cell>> {
        self.rows
            .get(index)
            .cloned()
            .ok_or_else(|| Error::not_found("row", index.to_string()))
    }

    fn write_row(&mut self, index: usize, cells: Vec<Cell>) -> Result<()> {
        let slot = self
            .rows
            .get_mut(index)
            .ok_or_else(|| Error::not_found("row", index.to_string()))?;
        *slot = cells;
        Ok(())
    }
}
