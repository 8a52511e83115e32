//! Summary table lifecycle properties over the in-memory medium.

use mth_common::ReferenceHandle;
use mth_table::schema::station_layout;
use mth_table::{Cell, MemTableStorage, Probe, Record, RowState, SummaryTable, Test};
use proptest::prelude::*;

fn run_row(table: &SummaryTable<MemTableStorage>, run_id: &str, rate: f64) -> Record {
    Record::from_pairs(
        table.layout().clone(),
        [
            ("run_id", Cell::from(run_id)),
            ("kind", Cell::from("BBMT")),
            ("sample_rate", Cell::from(rate)),
            ("reference", Cell::from(ReferenceHandle(7))),
        ],
    )
    .unwrap()
}

proptest! {
    #[test]
    fn append_is_monotonic(ids in proptest::collection::vec("[a-z]{1,6}", 1..30)) {
        let mut table = SummaryTable::open("Station", MemTableStorage::new(station_layout(), 1000)).unwrap();
        for (n, id) in ids.iter().enumerate() {
            let before = table.row_count().unwrap();
            let index = table.add_row(&run_row(&table, id, n as f64)).unwrap();
            prop_assert_eq!(table.row_count().unwrap(), before + 1);
            prop_assert_eq!(index, before);
            let hits = table.locate("run_id", &Probe::value(id.as_str()), Test::Eq).unwrap();
            prop_assert!(hits.contains(&index));
        }
    }

    #[test]
    fn tombstones_leave_other_rows_in_place(
        count in 2usize..20,
        victim_seed in any::<usize>(),
    ) {
        let mut table = SummaryTable::open("Station", MemTableStorage::new(station_layout(), 1000)).unwrap();
        let ids: Vec<String> = (0..count).map(|n| format!("run{n:03}")).collect();
        for id in &ids {
            table.add_row(&run_row(&table, id, 1.0)).unwrap();
        }
        let victim = victim_seed % count;
        table.remove_row(victim).unwrap();

        for (index, id) in ids.iter().enumerate() {
            let hits = table.locate("run_id", &Probe::value(id.as_str()), Test::Eq).unwrap();
            if index == victim {
                prop_assert!(!hits.contains(&index));
                prop_assert_eq!(table.row_state(index).unwrap(), RowState::Tombstoned);
            } else {
                prop_assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![index]);
            }
        }
    }

    #[test]
    fn inclusive_range_from_two_locates(rates in proptest::collection::vec(0u8..50, 1..20), low in 0u8..25, span in 0u8..25) {
        let mut table = SummaryTable::open("Station", MemTableStorage::new(station_layout(), 1000)).unwrap();
        for (n, rate) in rates.iter().enumerate() {
            table.add_row(&run_row(&table, &format!("r{n}"), f64::from(*rate))).unwrap();
        }
        let high = low.saturating_add(span);
        let ge = table.locate("sample_rate", &Probe::value(f64::from(low)), Test::Ge).unwrap();
        let le = table.locate("sample_rate", &Probe::value(f64::from(high)), Test::Le).unwrap();
        let inclusive: Vec<usize> = ge.intersection(&le).copied().collect();
        let expected: Vec<usize> = rates
            .iter()
            .enumerate()
            .filter(|(_, rate)| **rate >= low && **rate <= high)
            .map(|(index, _)| index)
            .collect();
        prop_assert_eq!(inclusive, expected);
    }
}

#[test]
fn capacity_bound_survives_tombstones() {
    let mut table = SummaryTable::open("Station", MemTableStorage::new(station_layout(), 2)).unwrap();
    table.add_row(&run_row(&table, "a", 1.0)).unwrap();
    table.add_row(&run_row(&table, "b", 1.0)).unwrap();
    table.remove_row(0).unwrap();
    assert!(table.add_row(&run_row(&table, "c", 1.0)).is_err());
}
