//! Lossy projection of record values into summary table cells.
//!
//! Unlike the flat/nested conversions this is one-way: lists collapse into
//! comma-joined text, date/times into their canonical string, and the table
//! later truncates text to its field width.

use crate::record::MetadataRecord;
use crate::value::AttrValue;

impl MetadataRecord {
    /// Text rendering of `path`, empty when unset.
    pub fn project_text(&self, path: &str) -> String {
        self.get(path).map(AttrValue::to_string).unwrap_or_default()
    }

    /// Numeric rendering of `path`, `None` when unset or not numeric.
    pub fn project_float(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(AttrValue::as_f64)
    }

    /// Concatenated text of several list-valued paths, skipping empty ones.
    pub fn project_joined(&self, paths: &[&str]) -> String {
        paths
            .iter()
            .map(|path| self.project_text(path))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use mth_common::EntityKind;
    use serde_json::json;

    use crate::record::MetadataRecord;

    #[test]
    fn lists_collapse_to_commas() {
        let mut record = MetadataRecord::new(EntityKind::Station).unwrap();
        record
            .set("channels_recorded", json!(["Ex", "Ey", "Hx"]))
            .unwrap();
        assert_eq!(record.project_text("channels_recorded"), "Ex,Ey,Hx");
        assert_eq!(record.project_text("comments"), "");
    }

    #[test]
    fn run_components_join_across_kinds() {
        let mut record = MetadataRecord::new(EntityKind::Run).unwrap();
        record
            .set("channels_recorded_electric", "Ex, Ey")
            .unwrap();
        record.set("channels_recorded_auxiliary", "T").unwrap();
        assert_eq!(
            record.project_joined(&[
                "channels_recorded_electric",
                "channels_recorded_magnetic",
                "channels_recorded_auxiliary",
            ]),
            "Ex,Ey,T"
        );
    }

    #[test]
    fn dates_project_canonically() {
        let mut record = MetadataRecord::new(EntityKind::Run).unwrap();
        record.set("time_period.start", "2020-1-2").unwrap();
        assert_eq!(
            record.project_text("time_period.start"),
            "2020-01-02T00:00:00.000000+00:00"
        );
        assert_eq!(record.project_float("sample_rate"), None);
    }
}
