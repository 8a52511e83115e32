//! Record layouts: ordered fixed-width fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "width", rename_all = "snake_case")]
pub enum FieldType {
    /// Byte string of at most `width` bytes.
    Str(usize),
    F64,
    I32,
    Bool,
    /// Reference handle to a container node.
    Reference,
}

impl FieldType {
    /// Storage width in bytes.
    pub fn width(&self) -> usize {
        match self {
            FieldType::Str(width) => *width,
            FieldType::F64 | FieldType::Reference => 8,
            FieldType::I32 => 4,
            FieldType::Bool => 1,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Str(width) => write!(f, "S{width}"),
            FieldType::F64 => write!(f, "f64"),
            FieldType::I32 => write!(f, "i32"),
            FieldType::Bool => write!(f, "bool"),
            FieldType::Reference => write!(f, "reference"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered sequence of fields shared by every row of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordLayout {
    fields: Vec<Field>,
}

impl RecordLayout {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Total row width in bytes.
    pub fn row_width(&self) -> usize {
        self.fields.iter().map(|field| field.field_type.width()).sum()
    }
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({}, {})", field.name, field.field_type)?;
        }
        f.write_str("]")
    }
}
