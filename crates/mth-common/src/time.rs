//! Date/time parsing and canonical normalization.
//!
//! Survey metadata arrives with timestamps in many textual shapes
//! (`2019-01-02`, `2020-1-2`, `2010-01-01T12:30:20.0000 UTC`, RFC 3339 with
//! offsets, ...). Every accepted shape is parsed to a UTC instant and stored in
//! one canonical form:
//!
//! ```text
//! 2010-01-01T12:30:20.000000+00:00
//! ```
//!
//! Normalizing an already canonical value is a no-op.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Formats carrying an explicit UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Formats without an offset; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%dT%H:%M:%S%.f",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a textual timestamp into a UTC instant.
///
/// Returns `None` when the text matches none of the accepted shapes.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = strip_utc_suffix(text.trim());
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(trimmed, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Render an instant in the canonical stored form.
pub fn format_canonical(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse and re-render a textual timestamp in canonical form.
pub fn normalize(text: &str) -> Option<String> {
    parse_instant(text).map(|instant| format_canonical(&instant))
}

/// Whether a table field holds timestamps and must be compared as instants.
pub fn is_temporal_field(name: &str) -> bool {
    name == "start" || name == "end" || name == "date" || name.ends_with("_date")
}

fn strip_utc_suffix(text: &str) -> &str {
    let len = text.len();
    if len >= 3 && text.is_char_boundary(len - 3) && text[len - 3..].eq_ignore_ascii_case("utc")
    {
        text[..len - 3].trim_end()
    } else {
        text
    }
}
