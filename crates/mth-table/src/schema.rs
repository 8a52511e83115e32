//! Summary table layouts per entity kind.
//!
//! Layouts:
//! - `Stations`: one row per station
//! - `Station`: one row per run
//! - `Run`: one row per channel
//! - `Standards`: one row per catalogued schema rule
//! - `Reports`: one row per report
//! - `Survey`, `Filters`: placeholder single-column layout
//!
//! Channels are leaves and carry no summary table.

use mth_common::EntityKind;

use crate::layout::{Field, FieldType, RecordLayout};

/// Name of the summary child of every group node.
pub const SUMMARY_NAME: &str = "Summary";

/// Helper to create a fixed-width string field.
fn string_field(name: &str, width: usize) -> Field {
    Field::new(name, FieldType::Str(width))
}

fn reference_field() -> Field {
    Field::new("reference", FieldType::Reference)
}

/// Layout of the summary table kept by nodes of `kind`.
pub fn layout_for(kind: EntityKind) -> Option<RecordLayout> {
    match kind {
        EntityKind::Stations => Some(stations_layout()),
        EntityKind::Station => Some(station_layout()),
        EntityKind::Run => Some(run_layout()),
        EntityKind::Standards => Some(standards_layout()),
        EntityKind::Reports => Some(reports_layout()),
        EntityKind::Survey | EntityKind::Filters => Some(placeholder_layout()),
        EntityKind::Electric | EntityKind::Magnetic | EntityKind::Auxiliary => None,
    }
}

/// Default hard row bound of the summary table kept by nodes of `kind`.
pub fn default_capacity(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Stations => 1000,
        EntityKind::Station => 1000,
        EntityKind::Run => 20,
        EntityKind::Standards => 500,
        EntityKind::Reports => 1000,
        EntityKind::Survey | EntityKind::Filters => 10_000,
        EntityKind::Electric | EntityKind::Magnetic | EntityKind::Auxiliary => 0,
    }
}

/// Layout for the stations collection: one row per station.
pub fn stations_layout() -> RecordLayout {
    RecordLayout::new(vec![
        string_field("archive_id", 5),
        string_field("start", 32),
        string_field("end", 32),
        string_field("components", 100),
        string_field("kind", 12),
        Field::new("latitude", FieldType::F64),
        Field::new("longitude", FieldType::F64),
        reference_field(),
    ])
}

/// Layout for a station: one row per run.
pub fn station_layout() -> RecordLayout {
    RecordLayout::new(vec![
        string_field("run_id", 20),
        string_field("start", 32),
        string_field("end", 32),
        string_field("components", 100),
        string_field("kind", 12),
        Field::new("sample_rate", FieldType::F64),
        reference_field(),
    ])
}

/// Layout for a run: one row per channel.
pub fn run_layout() -> RecordLayout {
    RecordLayout::new(vec![
        string_field("component", 20),
        string_field("start", 32),
        string_field("end", 32),
        Field::new("sample_count", FieldType::I32),
        string_field("kind", 12),
        string_field("units", 25),
        reference_field(),
    ])
}

/// Layout for the standards catalogue summary.
pub fn standards_layout() -> RecordLayout {
    RecordLayout::new(vec![
        string_field("attribute", 72),
        string_field("type", 15),
        Field::new("required", FieldType::Bool),
        string_field("style", 72),
        string_field("units", 32),
        string_field("description", 300),
        string_field("options", 150),
        string_field("alias", 72),
        string_field("example", 72),
    ])
}

/// Layout for reports.
pub fn reports_layout() -> RecordLayout {
    RecordLayout::new(vec![
        string_field("name", 5),
        string_field("type", 32),
        string_field("summary", 200),
        reference_field(),
    ])
}

fn placeholder_layout() -> RecordLayout {
    RecordLayout::new(vec![Field::new("default", FieldType::F64)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stations_layout() {
        let layout = stations_layout();
        assert_eq!(layout.len(), 8);
        assert_eq!(layout.field("archive_id").unwrap().field_type, FieldType::Str(5));
    }

    #[test]
    fn test_run_layout() {
        let layout = run_layout();
        assert_eq!(layout.index_of("sample_count"), Some(3));
        assert_eq!(layout.field("units").unwrap().field_type, FieldType::Str(25));
    }

    #[test]
    fn test_standards_layout() {
        let layout = standards_layout();
        assert_eq!(layout.len(), 9);
        assert_eq!(layout.field("required").unwrap().field_type, FieldType::Bool);
        assert!(layout.field("reference").is_none());
    }

    #[test]
    fn test_channels_have_no_layout() {
        for kind in [EntityKind::Electric, EntityKind::Magnetic, EntityKind::Auxiliary] {
            assert!(layout_for(kind).is_none());
            assert_eq!(default_capacity(kind), 0);
        }
    }

    #[test]
    fn test_group_kinds_have_layout_and_capacity() {
        for kind in EntityKind::ALL.into_iter().filter(|kind| !kind.is_channel()) {
            assert!(layout_for(kind).is_some(), "{kind}");
            assert!(default_capacity(kind) > 0, "{kind}");
        }
        assert_eq!(default_capacity(EntityKind::Run), 20);
    }
}
