//! Schema-validated metadata records.
//!
//! A [`MetadataRecord`] holds the attributes of one archive entity. Every
//! assignment is checked against the entity kind's schema and coerced to the
//! declared type, so a record is always consistent with its rules. Records
//! convert losslessly to and from:
//! - flat dotted-key maps (`location.latitude -> 40.1`)
//! - nested maps (`location -> { latitude -> 40.1 }`)
//! - JSON text keyed by the lowercase entity kind
//!
//! Rendering attribute values into fixed-width table cells is a separate,
//! lossy step (see [`projection`]).

pub mod coerce;
pub mod projection;
pub mod record;
pub mod value;

pub use coerce::{coerce, sexagesimal_to_decimal};
pub use mth_common::{Error, Result};
pub use record::{MetadataRecord, ENTITY_KIND_ATTR, REFERENCE_ATTR};
pub use value::AttrValue;
