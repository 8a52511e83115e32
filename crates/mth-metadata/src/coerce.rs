//! Coercion of loosely typed input into schema-declared types.
//!
//! Accepted input per declared type:
//!
//! | type      | accepts                                                        |
//! |-----------|----------------------------------------------------------------|
//! | string    | strings, numbers and booleans (rendered as text)               |
//! | integer   | integral numbers, numeric strings                              |
//! | float     | numbers, numeric strings, `D:M:S.sss` for coordinates          |
//! | boolean   | booleans, `0`/`1`, `true/false/yes/no/1/0` in any case         |
//! | datetime  | any shape [`mth_common::time::parse_instant`] understands      |
//! | reference | non-negative integers                                          |
//!
//! List-valued rules coerce each element independently and also accept a
//! comma-separated string. Scalar rules reject list input.

use chrono::SubsecRound;
use mth_common::time::parse_instant;
use mth_common::{Error, ReferenceHandle, Result};
use mth_standards::{SchemaRule, ValueType};
use serde_json::Value;

use crate::value::AttrValue;

/// Coerce `raw` to the type declared by `rule`.
///
/// Returns `Ok(None)` for `null`, which unsets the attribute.
pub fn coerce(rule: &SchemaRule, raw: &Value) -> Result<Option<AttrValue>> {
    match raw {
        Value::Null => Ok(None),
        Value::Array(items) => {
            if !rule.list {
                return Err(Error::coercion(
                    &rule.path,
                    format!("single {}", rule.value_type),
                    raw,
                ));
            }
            let values = items
                .iter()
                .map(|item| coerce_scalar(rule, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(AttrValue::List(values)))
        }
        Value::String(text) if rule.list => {
            let values = text
                .split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(|piece| coerce_scalar(rule, &Value::String(piece.to_string())))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(AttrValue::List(values)))
        }
        _ if rule.list => Ok(Some(AttrValue::List(vec![coerce_scalar(rule, raw)?]))),
        _ => coerce_scalar(rule, raw).map(Some),
    }
}

fn coerce_scalar(rule: &SchemaRule, raw: &Value) -> Result<AttrValue> {
    let value = match rule.value_type {
        ValueType::String => AttrValue::Str(coerce_string(rule, raw)?),
        ValueType::Int => AttrValue::Int(coerce_int(rule, raw)?),
        ValueType::Float => AttrValue::Float(coerce_float(rule, raw)?),
        ValueType::Bool => AttrValue::Bool(coerce_bool(rule, raw)?),
        ValueType::DateTime => {
            let text = raw
                .as_str()
                .ok_or_else(|| Error::coercion(&rule.path, "datetime", raw))?;
            let instant =
                parse_instant(text).ok_or_else(|| Error::coercion(&rule.path, "datetime", text))?;
            AttrValue::DateTime(instant.trunc_subsecs(6))
        }
        ValueType::Reference => {
            let raw_handle = match raw {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            }
            .ok_or_else(|| Error::coercion(&rule.path, "reference", raw))?;
            AttrValue::Reference(ReferenceHandle(raw_handle))
        }
    };
    Ok(value)
}

fn coerce_string(rule: &SchemaRule, raw: &Value) -> Result<String> {
    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(Error::coercion(&rule.path, "string", raw)),
    };

    if rule.is_controlled() {
        return rule
            .match_option(&text)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::range(
                    &rule.path,
                    format!("{text} is not one of [ {} ]", rule.options.join(" | ")),
                )
            });
    }
    Ok(text)
}

fn coerce_int(rule: &SchemaRule, raw: &Value) -> Result<i64> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    parsed.ok_or_else(|| Error::coercion(&rule.path, "integer", raw))
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn coerce_float(rule: &SchemaRule, raw: &Value) -> Result<f64> {
    let limit = rule.coordinate_limit();
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if limit.is_some() && s.contains(':') => {
            Some(sexagesimal_to_decimal(s).map_err(|_| Error::coercion(&rule.path, "degrees", s))?)
        }
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| Error::coercion(&rule.path, "float", raw))?;

    if let Some(limit) = limit {
        if value.abs() > limit {
            return Err(Error::range(
                &rule.path,
                format!("value {value} out of range (|{}| <= {limit})", rule.leaf_name()),
            ));
        }
    }
    Ok(value)
}

fn coerce_bool(rule: &SchemaRule, raw: &Value) -> Result<bool> {
    let parsed = match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| Error::coercion(&rule.path, "boolean", raw))
}

/// Convert sexagesimal `D:M:S.sss` (or `D:M`) text into signed decimal
/// degrees.
///
/// A leading `-` on the degrees applies to the whole value. Minutes and
/// seconds must lie in `[0, 60)`.
pub fn sexagesimal_to_decimal(text: &str) -> Result<f64> {
    let text = text.trim();
    let parts: Vec<&str> = text.split(':').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(Error::coercion("coordinate", "D:M:S.sss", text));
    }

    let negative = parts[0].starts_with('-');
    let mut fields = [0.0f64; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::coercion("coordinate", "D:M:S.sss", text))?;
    }

    let [degrees, minutes, seconds] = fields;
    if !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(Error::range(
            "coordinate",
            format!("minutes and seconds must be in [0, 60): {text}"),
        ));
    }

    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    Ok(if negative { -magnitude } else { magnitude })
}
