//! Property tests for record conversions and coercion.

use mth_common::EntityKind;
use mth_metadata::{AttrValue, Error, MetadataRecord};
use proptest::prelude::*;
use serde_json::{json, Value};

fn name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,15}"
}

prop_compose! {
    fn station_record()(
        archive_id in "[A-Z]{2}[0-9]{3}",
        geographic_name in proptest::option::of(name()),
        latitude in -90.0f64..=90.0,
        longitude in -180.0f64..=180.0,
        elevation in proptest::option::of(-500.0f64..5000.0),
        channels in proptest::collection::vec("[EH][xyz]", 0..5),
        num_channels in proptest::option::of(0i64..32),
        start_secs in 0i64..2_000_000_000,
        data_type in prop::sample::select(vec!["MT", "bbmt", "AMT"]),
    ) -> MetadataRecord {
        let mut record = MetadataRecord::new(EntityKind::Station).unwrap();
        record.set("archive_id", archive_id).unwrap();
        if let Some(n) = geographic_name {
            record.set("geographic_name", n).unwrap();
        }
        record.set("location.latitude", latitude).unwrap();
        record.set("location.longitude", longitude).unwrap();
        if let Some(e) = elevation {
            record.set("location.elevation", e).unwrap();
        }
        record.set("channels_recorded", Value::from(channels)).unwrap();
        if let Some(n) = num_channels {
            record.set("num_channels", n).unwrap();
        }
        let start = chrono::DateTime::from_timestamp(start_secs, 0).unwrap();
        record.set("time_period.start", start.to_rfc3339()).unwrap();
        record.set("data_type", data_type).unwrap();
        record
    }
}

proptest! {
    #[test]
    fn flat_map_round_trip(record in station_record()) {
        let back = MetadataRecord::from_flat_map(EntityKind::Station, &record.to_flat_map()).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn nested_map_round_trip(record in station_record()) {
        let back = MetadataRecord::from_nested_map(EntityKind::Station, &record.to_nested_map()).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn text_round_trip(record in station_record()) {
        let back = MetadataRecord::from_text(&record.to_text().unwrap()).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn unknown_paths_always_fail(suffix in "[a-z]{1,12}", value in any::<i64>()) {
        let mut record = MetadataRecord::new(EntityKind::Run).unwrap();
        let path = format!("not_catalogued.{suffix}");
        let is_unknown = matches!(record.set(&path, value), Err(Error::UnknownAttribute { .. }));
        prop_assert!(is_unknown);
        let is_unknown = matches!(record.set(&path, json!("text")), Err(Error::UnknownAttribute { .. }));
        prop_assert!(is_unknown);
    }

    #[test]
    fn coordinate_normalization_is_idempotent(
        degrees in 0u32..90,
        minutes in 0u32..60,
        seconds in 0.0f64..59.999,
        negative in any::<bool>(),
    ) {
        let sign = if negative { "-" } else { "" };
        let mut record = MetadataRecord::new(EntityKind::Station).unwrap();
        record.set("location.latitude", format!("{sign}{degrees}:{minutes}:{seconds}")).unwrap();
        let once = record.get("location.latitude").cloned().unwrap();

        record.set("location.latitude", once.to_json()).unwrap();
        prop_assert_eq!(record.get("location.latitude"), Some(&once));
    }

    #[test]
    fn datetime_normalization_is_idempotent(secs in 0i64..4_000_000_000, micros in 0u32..1_000_000) {
        let instant = chrono::DateTime::from_timestamp(secs, micros * 1000).unwrap();
        let mut record = MetadataRecord::new(EntityKind::Run).unwrap();
        record.set("time_period.end", instant.to_rfc3339()).unwrap();
        let once = record.get("time_period.end").cloned().unwrap();

        record.set("time_period.end", once.to_json()).unwrap();
        prop_assert_eq!(record.get("time_period.end"), Some(&once));
        prop_assert!(matches!(once, AttrValue::DateTime(_)));
    }
}

#[test]
fn sexagesimal_scenario() {
    let mut record = MetadataRecord::new(EntityKind::Station).unwrap();
    record.set("location.latitude", "40:20:10.15").unwrap();
    let value = record.get("location.latitude").and_then(AttrValue::as_f64).unwrap();
    assert!((value - 40.33615).abs() < 1e-5);
}

#[test]
fn latitude_out_of_range_scenario() {
    let mut record = MetadataRecord::new(EntityKind::Station).unwrap();
    let err = record.set("location.latitude", 96.78).unwrap_err();
    assert!(matches!(err, Error::Range { .. }));
    assert!(record.get("location.latitude").is_none());
}

#[test]
fn date_shapes_store_identically() {
    let mut a = MetadataRecord::new(EntityKind::Run).unwrap();
    let mut b = MetadataRecord::new(EntityKind::Run).unwrap();
    a.set("time_period.start", "2020-1-2").unwrap();
    b.set("time_period.start", "2020-01-02T00:00:00 UTC").unwrap();
    assert_eq!(a, b);
}
