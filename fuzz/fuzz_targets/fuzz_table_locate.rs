//! Fuzz target for summary table predicate queries.
//!
//! Builds a small run summary from arbitrary rows, then runs an arbitrary
//! test against an arbitrary field. Errors are fine; panics are not.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mth_common::EntityKind;
use mth_table::{layout_for, Cell, MemTableStorage, Probe, Record, SummaryTable, Test};
use std::sync::Arc;

#[derive(Debug, Arbitrary)]
struct Input {
    rows: Vec<(String, String, i32)>,
    field: String,
    test: String,
    low: String,
    high: Option<String>,
}

fuzz_target!(|input: Input| {
    let Some(layout) = layout_for(EntityKind::Run) else {
        return;
    };
    let Ok(mut table) = SummaryTable::open("fuzz", MemTableStorage::new(layout, 32)) else {
        return;
    };
    let layout = Arc::clone(table.layout());
    for (component, start, count) in input.rows.into_iter().take(32) {
        let pairs = [
            ("component", Cell::from(component)),
            ("start", Cell::from(start)),
            ("sample_count", Cell::from(count)),
        ];
        if let Ok(record) = Record::from_pairs(layout.clone(), pairs) {
            let _ = table.add_row(&record);
        }
    }

    let Ok(test) = input.test.parse::<Test>() else {
        return;
    };
    let probe = match input.high {
        Some(high) => Probe::pair(input.low, high),
        None => Probe::value(input.low),
    };
    if let Ok(found) = table.locate(&input.field, &probe, test) {
        assert!(found.iter().all(|index| *index < table.row_count().unwrap_or(0)));
    }
});
