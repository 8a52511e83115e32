//! Error types for mth archives.
//!
//! Every failure surfaced by the metadata engine, the summary tables and the
//! container hierarchy is one variant of [`Error`]. Errors are never retried
//! internally; they carry:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - Enough context to serialize into a [`StructuredError`]
//!
//! ```json
//! {
//!   "code": 12,
//!   "category": "schema",
//!   "message": "location.latitude: value 96.78 out of range (|latitude| <= 90)",
//!   "context": { "path": "location.latitude" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for mth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Attribute lookup, coercion and domain errors.
    Schema,
    /// Summary table layout and capacity errors.
    Table,
    /// Container node lookup and lifetime errors.
    Container,
    /// Configuration loading errors.
    Config,
    /// Serialization and file I/O errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Schema => write!(f, "schema"),
            ErrorCategory::Table => write!(f, "table"),
            ErrorCategory::Container => write!(f, "container"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for mth archives.
#[derive(Error, Debug)]
pub enum Error {
    // Schema errors (10-19)
    #[error("unknown attribute: {path}")]
    UnknownAttribute { path: String },

    #[error("{path}: cannot coerce {value} to {expected}")]
    TypeCoercion {
        path: String,
        expected: String,
        value: String,
    },

    #[error("{path}: {message}")]
    Range { path: String, message: String },

    // Table errors (20-29)
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("table {table} is full: capacity of {capacity} rows reached")]
    CapacityExceeded { table: String, capacity: usize },

    // Container errors (30-39)
    #[error("{what} not found: {name}")]
    NotFound { what: String, name: String },

    #[error("resource is closed: {0}")]
    ClosedResource(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("container error: {0}")]
    Container(String),

    // Config errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] error.
    pub fn not_found(what: impl Into<String>, name: impl Into<String>) -> Self {
        Error::NotFound {
            what: what.into(),
            name: name.into(),
        }
    }

    /// Shorthand for a [`Error::TypeCoercion`] error.
    pub fn coercion(
        path: impl Into<String>,
        expected: impl Into<String>,
        value: impl std::fmt::Display,
    ) -> Self {
        Error::TypeCoercion {
            path: path.into(),
            expected: expected.into(),
            value: value.to_string(),
        }
    }

    /// Shorthand for a [`Error::Range`] error.
    pub fn range(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Range {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Schema errors
    /// - 20-29: Table errors
    /// - 30-39: Container errors
    /// - 40-49: Configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::UnknownAttribute { .. } => 10,
            Error::TypeCoercion { .. } => 11,
            Error::Range { .. } => 12,
            Error::SchemaMismatch(_) => 20,
            Error::CapacityExceeded { .. } => 21,
            Error::NotFound { .. } => 30,
            Error::ClosedResource(_) => 31,
            Error::InvalidState(_) => 32,
            Error::Container(_) => 33,
            Error::Config(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownAttribute { .. } | Error::TypeCoercion { .. } | Error::Range { .. } => {
                ErrorCategory::Schema
            }

            Error::SchemaMismatch(_) | Error::CapacityExceeded { .. } => ErrorCategory::Table,

            Error::NotFound { .. }
            | Error::ClosedResource(_)
            | Error::InvalidState(_)
            | Error::Container(_) => ErrorCategory::Container,

            Error::Config(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Additional structured context (attribute path, table name, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UnknownAttribute { path } | Error::Range { path, .. } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::TypeCoercion {
                path,
                expected,
                value,
            } => {
                context.insert("path".to_string(), serde_json::json!(path));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            Error::CapacityExceeded { table, capacity } => {
                context.insert("table".to_string(), serde_json::json!(table));
                context.insert("capacity".to_string(), serde_json::json!(capacity));
            }
            Error::NotFound { what, name } => {
                context.insert("what".to_string(), serde_json::json!(what));
                context.insert("name".to_string(), serde_json::json!(name));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Serialize to a single-line JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"code":{},"category":"{}","message":"serialization failed"}}"#,
                self.code, self.category
            )
        })
    }
}
