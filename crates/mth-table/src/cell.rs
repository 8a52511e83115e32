//! Cell values and fixed-layout records.

use mth_common::{Error, ReferenceHandle, Result};
use std::fmt;
use std::sync::Arc;

use crate::layout::{FieldType, RecordLayout};

/// One fixed-width cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Str(String),
    F64(f64),
    I32(i32),
    Bool(bool),
    Reference(ReferenceHandle),
}

impl Cell {
    /// The empty value of `field_type`, as written by tombstones.
    pub fn empty(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Str(_) => Cell::Str(String::new()),
            FieldType::F64 => Cell::F64(0.0),
            FieldType::I32 => Cell::I32(0),
            FieldType::Bool => Cell::Bool(false),
            FieldType::Reference => Cell::Reference(ReferenceHandle::NULL),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Str(s) => s.is_empty(),
            Cell::F64(v) => *v == 0.0,
            Cell::I32(v) => *v == 0,
            Cell::Bool(b) => !b,
            Cell::Reference(handle) => handle.is_null(),
        }
    }

    /// Whether this cell can be stored in a field of `field_type`.
    pub fn fits(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (Cell::Str(_), FieldType::Str(_))
                | (Cell::F64(_), FieldType::F64)
                | (Cell::I32(_), FieldType::I32)
                | (Cell::Bool(_), FieldType::Bool)
                | (Cell::Reference(_), FieldType::Reference)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::F64(v) => Some(*v),
            Cell::I32(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ReferenceHandle> {
        match self {
            Cell::Reference(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Str(s) => f.write_str(s),
            Cell::F64(v) => write!(f, "{v}"),
            Cell::I32(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Reference(handle) if handle.is_null() => Ok(()),
            Cell::Reference(_) => f.write_str("<reference>"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Str(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Str(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::F64(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I32(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<ReferenceHandle> for Cell {
    fn from(value: ReferenceHandle) -> Self {
        Cell::Reference(value)
    }
}

/// Truncate `text` to at most `width` bytes without splitting a character.
pub fn truncate_to_width(text: &str, width: usize) -> &str {
    if text.len() <= width {
        return text;
    }
    let mut end = width;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// One row: a cell per field of its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    layout: Arc<RecordLayout>,
    cells: Vec<Cell>,
}

impl Record {
    /// Build a record from cells in layout order.
    ///
    /// Strings longer than their field width are truncated; a cell count or
    /// type that disagrees with the layout is a `SchemaMismatch`.
    pub fn new(layout: Arc<RecordLayout>, cells: Vec<Cell>) -> Result<Self> {
        if cells.len() != layout.len() {
            return Err(Error::SchemaMismatch(format!(
                "record has {} cells, layout {} has {}",
                cells.len(),
                layout,
                layout.len()
            )));
        }
        let cells = layout
            .fields()
            .iter()
            .zip(cells)
            .map(|(field, cell)| {
                if !cell.fits(field.field_type) {
                    return Err(Error::SchemaMismatch(format!(
                        "field {} is {}, got {:?}",
                        field.name, field.field_type, cell
                    )));
                }
                Ok(match (cell, field.field_type) {
                    (Cell::Str(s), FieldType::Str(width)) if s.len() > width => {
                        Cell::Str(truncate_to_width(&s, width).to_string())
                    }
                    (cell, _) => cell,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layout, cells })
    }

    /// Build a record from named cells; unnamed fields are empty.
    pub fn from_pairs<I, K>(layout: Arc<RecordLayout>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Cell)>,
        K: AsRef<str>,
    {
        let mut cells: Vec<Cell> = layout
            .fields()
            .iter()
            .map(|field| Cell::empty(field.field_type))
            .collect();
        for (name, cell) in pairs {
            let index = layout.index_of(name.as_ref()).ok_or_else(|| {
                Error::SchemaMismatch(format!("no field {} in {}", name.as_ref(), layout))
            })?;
            cells[index] = cell;
        }
        Self::new(layout, cells)
    }

    /// The all-empty tombstone record for `layout`.
    pub fn tombstone(layout: Arc<RecordLayout>) -> Self {
        let cells = layout
            .fields()
            .iter()
            .map(|field| Cell::empty(field.field_type))
            .collect();
        Self { layout, cells }
    }

    pub fn layout(&self) -> &Arc<RecordLayout> {
        &self.layout
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.layout.index_of(name).map(|index| &self.cells[index])
    }

    /// Whether every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}
