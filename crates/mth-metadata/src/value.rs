//! Typed attribute values.

use chrono::{DateTime, Utc};
use mth_common::time::format_canonical;
use mth_common::ReferenceHandle;
use serde_json::Value;
use std::fmt;

/// A coerced attribute value.
///
/// Values only exist after passing through [`crate::coerce`], so floats are
/// always finite and date/times are truncated to microseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Reference(ReferenceHandle),
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Loosely typed external form. Date/times render canonically.
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Str(s) => Value::String(s.clone()),
            AttrValue::Int(i) => Value::from(*i),
            AttrValue::Float(f) => Value::from(*f),
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::DateTime(dt) => Value::String(format_canonical(dt)),
            AttrValue::Reference(handle) => Value::from(handle.0),
            AttrValue::List(items) => Value::Array(items.iter().map(AttrValue::to_json).collect()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            AttrValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ReferenceHandle> {
        match self {
            AttrValue::Reference(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::DateTime(dt) => f.write_str(&format_canonical(dt)),
            AttrValue::Reference(handle) => write!(f, "{handle}"),
            AttrValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn datetime_renders_canonically() {
        let dt = mth_common::time::parse_instant("2020-01-02").unwrap();
        assert_eq!(
            AttrValue::DateTime(dt).to_json(),
            json!("2020-01-02T00:00:00.000000+00:00")
        );
    }

    #[test]
    fn list_displays_comma_joined() {
        let value = AttrValue::List(vec![
            AttrValue::Str("Ex".into()),
            AttrValue::Str("Hy".into()),
        ]);
        assert_eq!(value.to_string(), "Ex,Hy");
        assert_eq!(value.to_json(), json!(["Ex", "Hy"]));
    }

    #[test]
    fn int_widens_to_f64() {
        assert_eq!(AttrValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttrValue::Str("3".into()).as_f64(), None);
    }
}
