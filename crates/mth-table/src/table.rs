//! The summary table engine.

use chrono::{DateTime, Utc};
use mth_common::time::{is_temporal_field, parse_instant};
use mth_common::{Error, Result};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::cell::{Cell, Record};
use crate::layout::{FieldType, RecordLayout};
use crate::predicate::{Probe, Test};
use crate::storage::TableStorage;

/// Lifecycle state of an allocated row. Tombstoned is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Present,
    Tombstoned,
}

/// Fixed-layout table of fixed-width rows over a [`TableStorage`] medium.
///
/// Row indices are stable: rows are appended at the end and removal writes
/// a tombstone in place.
pub struct SummaryTable<S> {
    name: String,
    layout: Arc<RecordLayout>,
    storage: S,
}

impl<S: TableStorage> SummaryTable<S> {
    /// Attach to initialized storage.
    pub fn open(name: impl Into<String>, storage: S) -> Result<Self> {
        let layout = storage.layout()?;
        Ok(Self {
            name: name.into(),
            layout,
            storage,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &Arc<RecordLayout> {
        &self.layout
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether the table's rows share `layout`.
    pub fn check_layout(&self, layout: &RecordLayout) -> bool {
        *self.layout == *layout
    }

    /// Allocated rows, tombstones included.
    pub fn row_count(&self) -> Result<usize> {
        self.storage.len()
    }

    /// Hard upper bound on the row count.
    pub fn capacity(&self) -> Result<usize> {
        self.storage.max_len()
    }

    /// Append `record`, returning its index.
    pub fn add_row(&mut self, record: &Record) -> Result<usize> {
        self.ensure_layout(record)?;
        if record.is_empty() {
            return Err(Error::InvalidState(format!(
                "cannot append an empty row to {}",
                self.name
            )));
        }

        let index = self.storage.len()?;
        let capacity = self.storage.max_len()?;
        if index >= capacity {
            return Err(Error::CapacityExceeded {
                table: self.name.clone(),
                capacity,
            });
        }

        self.storage.resize(index + 1)?;
        self.storage.write_row(index, record.cells().to_vec())?;
        self.storage.touch()?;
        debug!(table = %self.name, index, "appended row");
        Ok(index)
    }

    /// Overwrite a live row in place.
    pub fn overwrite_row(&mut self, index: usize, record: &Record) -> Result<()> {
        self.ensure_layout(record)?;
        if record.is_empty() {
            return Err(Error::InvalidState(format!(
                "use remove_row to clear row {index} of {}",
                self.name
            )));
        }
        if self.row_state(index)? == RowState::Tombstoned {
            return Err(Error::InvalidState(format!(
                "row {index} of {} is tombstoned",
                self.name
            )));
        }
        self.storage.write_row(index, record.cells().to_vec())?;
        self.storage.touch()?;
        debug!(table = %self.name, index, "overwrote row");
        Ok(())
    }

    /// Tombstone row `index`. Removing a tombstone again is a no-op.
    pub fn remove_row(&mut self, index: usize) -> Result<()> {
        if self.row_state(index)? == RowState::Tombstoned {
            return Ok(());
        }
        let tombstone = Record::tombstone(self.layout.clone());
        self.storage.write_row(index, tombstone.into_cells())?;
        self.storage.touch()?;
        debug!(table = %self.name, index, "tombstoned row");
        Ok(())
    }

    pub fn row(&self, index: usize) -> Result<Record> {
        let len = self.storage.len()?;
        if index >= len {
            return Err(Error::not_found(
                format!("row of {}", self.name),
                index.to_string(),
            ));
        }
        Record::new(self.layout.clone(), self.storage.read_row(index)?)
    }

    pub fn row_state(&self, index: usize) -> Result<RowState> {
        Ok(if self.row(index)?.is_empty() {
            RowState::Tombstoned
        } else {
            RowState::Present
        })
    }

    /// Every allocated row in index order, tombstones included.
    pub fn rows(&self) -> Result<impl Iterator<Item = Result<Record>> + '_> {
        let len = self.storage.len()?;
        Ok((0..len).map(move |index| self.row(index)))
    }

    /// Present rows with their indices.
    pub fn live_rows(&self) -> Result<Vec<(usize, Record)>> {
        let mut live = Vec::new();
        for (index, row) in self.rows()?.enumerate() {
            let row = row?;
            if !row.is_empty() {
                live.push((index, row));
            }
        }
        Ok(live)
    }

    /// Indices of rows whose `field` satisfies `test` against `probe`.
    ///
    /// Strings compare as byte sequences. Temporal string fields compare as
    /// instants whenever the probe parses as one. `Between` is exclusive on
    /// both bounds.
    pub fn locate(&self, field: &str, probe: &Probe, test: Test) -> Result<BTreeSet<usize>> {
        let column = self
            .layout
            .index_of(field)
            .ok_or_else(|| Error::not_found(format!("field of {}", self.name), field))?;
        let field_type = self.layout.fields()[column].field_type;
        let temporal = matches!(field_type, FieldType::Str(_)) && is_temporal_field(field);

        let bounds = match (test, probe) {
            (Test::Between, Probe::Pair(low, high)) => (
                Key::from_probe(field, field_type, temporal, low)?,
                Some(Key::from_probe(field, field_type, temporal, high)?),
            ),
            (Test::Between, Probe::Value(_)) => {
                return Err(Error::InvalidState(
                    "between requires a pair of bounds".to_string(),
                ))
            }
            (_, Probe::Pair(..)) => {
                return Err(Error::InvalidState(format!(
                    "{test} takes a single value, not a pair"
                )))
            }
            (_, Probe::Value(value)) => (Key::from_probe(field, field_type, temporal, value)?, None),
        };

        let mut found = BTreeSet::new();
        for index in 0..self.storage.len()? {
            let cells = self.storage.read_row(index)?;
            let Some(stored) = cells.get(column).and_then(|cell| bounds.0.stored(cell)) else {
                continue;
            };
            let matched = match &bounds.1 {
                Some(high) => {
                    stored.compare(&bounds.0) == Some(Ordering::Greater)
                        && stored.compare(high) == Some(Ordering::Less)
                }
                None => stored
                    .compare(&bounds.0)
                    .is_some_and(|ordering| test.accepts(ordering)),
            };
            if matched {
                found.insert(index);
            }
        }
        Ok(found)
    }

    fn ensure_layout(&self, record: &Record) -> Result<()> {
        if self.check_layout(record.layout()) {
            Ok(())
        } else {
            Err(Error::SchemaMismatch(format!(
                "record layout {} does not match {} layout {}",
                record.layout(),
                self.name,
                self.layout
            )))
        }
    }
}

/// Comparable form of a cell or probe.
#[derive(Debug, Clone, PartialEq)]
enum Key {
    Instant(DateTime<Utc>),
    Bytes(Vec<u8>),
    Num(f64),
    Bool(bool),
    Reference(u64),
}

impl Key {
    fn from_probe(field: &str, field_type: FieldType, temporal: bool, probe: &Cell) -> Result<Self> {
        let mismatch = || Error::coercion(field, field_type.to_string(), format!("{probe:?}"));
        match (field_type, probe) {
            (FieldType::Str(_), Cell::Str(text)) => Ok(match parse_instant(text) {
                Some(instant) if temporal => Key::Instant(instant),
                _ => Key::Bytes(text.as_bytes().to_vec()),
            }),
            (FieldType::F64 | FieldType::I32, Cell::F64(_) | Cell::I32(_)) => {
                probe.as_f64().map(Key::Num).ok_or_else(mismatch)
            }
            (FieldType::F64 | FieldType::I32, Cell::Str(text)) => {
                text.trim().parse::<f64>().map(Key::Num).map_err(|_| mismatch())
            }
            (FieldType::Bool, Cell::Bool(b)) => Ok(Key::Bool(*b)),
            (FieldType::Reference, Cell::Reference(handle)) => Ok(Key::Reference(handle.0)),
            _ => Err(mismatch()),
        }
    }

    /// Key of a stored cell, shaped like this probe key. `None` when the
    /// cell cannot be compared (unparsable instant).
    fn stored(&self, cell: &Cell) -> Option<Key> {
        match (self, cell) {
            (Key::Instant(_), Cell::Str(text)) => parse_instant(text).map(Key::Instant),
            (Key::Bytes(_), Cell::Str(text)) => Some(Key::Bytes(text.as_bytes().to_vec())),
            (Key::Num(_), cell) => cell.as_f64().map(Key::Num),
            (Key::Bool(_), Cell::Bool(b)) => Some(Key::Bool(*b)),
            (Key::Reference(_), Cell::Reference(handle)) => Some(Key::Reference(handle.0)),
            _ => None,
        }
    }

    fn compare(&self, other: &Key) -> Option<Ordering> {
        match (self, other) {
            (Key::Instant(a), Key::Instant(b)) => Some(a.cmp(b)),
            (Key::Bytes(a), Key::Bytes(b)) => Some(a.cmp(b)),
            (Key::Num(a), Key::Num(b)) => a.partial_cmp(b),
            (Key::Bool(a), Key::Bool(b)) => Some(a.cmp(b)),
            (Key::Reference(a), Key::Reference(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl<S: TableStorage, T: TableStorage> PartialEq<SummaryTable<T>> for SummaryTable<S> {
    fn eq(&self, other: &SummaryTable<T>) -> bool {
        if self.layout != other.layout {
            return false;
        }
        let (Ok(mine), Ok(theirs)) = (self.storage.len(), other.storage.len()) else {
            return false;
        };
        mine == theirs
            && (0..mine).all(|index| {
                matches!(
                    (self.storage.read_row(index), other.storage.read_row(index)),
                    (Ok(a), Ok(b)) if a == b
                )
            })
    }
}

impl<S: TableStorage> fmt::Display for SummaryTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid: Vec<Vec<String>> = vec![std::iter::once("index".to_string())
            .chain(self.layout.names().map(str::to_string))
            .collect()];

        let rows = match self.rows() {
            Ok(rows) => rows,
            Err(err) => return write!(f, "<{} unreadable: {err}>", self.name),
        };
        for (index, row) in rows.enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(err) => return write!(f, "<{} unreadable: {err}>", self.name),
            };
            let tombstoned = row.is_empty();
            let mut line = vec![index.to_string()];
            line.extend(row.cells().iter().map(|cell| {
                if tombstoned {
                    String::new()
                } else {
                    cell.to_string()
                }
            }));
            grid.push(line);
        }

        let widths: Vec<usize> = (0..grid[0].len())
            .map(|column| {
                grid.iter()
                    .map(|line| line[column].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for (line_no, line) in grid.iter().enumerate() {
            let rendered: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(text, width)| format!("{text:<width$}"))
                .collect();
            writeln!(f, "{}", rendered.join(" | ").trim_end())?;
            if line_no == 0 {
                let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
                writeln!(f, "{}", rule.join("-+-"))?;
            }
        }
        Ok(())
    }
}

impl<S> fmt::Debug for SummaryTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryTable")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Field;
    use crate::storage::MemTableStorage;
    use mth_common::ReferenceHandle;

    fn run_layout() -> RecordLayout {
        RecordLayout::new(vec![
            Field::new("component", FieldType::Str(20)),
            Field::new("start", FieldType::Str(32)),
            Field::new("sample_count", FieldType::I32),
            Field::new("reference", FieldType::Reference),
        ])
    }

    fn table(capacity: usize) -> SummaryTable<MemTableStorage> {
        SummaryTable::open("Run", MemTableStorage::new(run_layout(), capacity)).unwrap()
    }

    fn row(table: &SummaryTable<MemTableStorage>, component: &str, start: &str, count: i32) -> Record {
        Record::from_pairs(
            table.layout().clone(),
            [
                ("component", Cell::from(component)),
                ("start", Cell::from(start)),
                ("sample_count", Cell::from(count)),
                ("reference", Cell::from(ReferenceHandle(count as u64 + 1))),
            ],
        )
        .unwrap()
    }

    #[test]
    fn append_returns_next_index() {
        let mut t = table(5);
        let a = row(&t, "Ex", "2020-01-01", 10);
        let b = row(&t, "Ey", "2020-01-02", 20);
        assert_eq!(t.add_row(&a).unwrap(), 0);
        assert_eq!(t.add_row(&b).unwrap(), 1);
        assert_eq!(t.row_count().unwrap(), 2);
        assert_eq!(t.row(1).unwrap(), b);
    }

    #[test]
    fn capacity_is_a_hard_bound() {
        let mut t = table(1);
        t.add_row(&row(&t, "Ex", "", 1)).unwrap();
        let err = t.add_row(&row(&t, "Ey", "", 2)).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { capacity: 1, .. }));
        assert_eq!(t.row_count().unwrap(), 1);
    }

    #[test]
    fn mismatched_layout_is_rejected() {
        let mut t = table(5);
        let other = Arc::new(RecordLayout::new(vec![Field::new("component", FieldType::Str(20))]));
        let record = Record::from_pairs(other, [("component", Cell::from("Ex"))]).unwrap();
        assert!(matches!(t.add_row(&record).unwrap_err(), Error::SchemaMismatch(_)));
    }

    #[test]
    fn empty_record_cannot_be_appended() {
        let mut t = table(5);
        let tombstone = Record::tombstone(t.layout().clone());
        assert!(matches!(t.add_row(&tombstone).unwrap_err(), Error::InvalidState(_)));
    }

    #[test]
    fn temporal_fields_compare_as_instants() {
        let mut t = table(5);
        t.add_row(&row(&t, "Ex", "2020-01-02T00:00:00.000000+00:00", 1)).unwrap();
        t.add_row(&row(&t, "Ey", "2020-03-01T00:00:00.000000+00:00", 2)).unwrap();

        let padded = t.locate("start", &Probe::value("2020-01-02"), Test::Eq).unwrap();
        let unpadded = t.locate("start", &Probe::value("2020-1-2"), Test::Eq).unwrap();
        assert_eq!(padded, unpadded);
        assert_eq!(padded.into_iter().collect::<Vec<_>>(), vec![0]);

        let later = t.locate("start", &Probe::value("2020-2-1"), Test::Gt).unwrap();
        assert_eq!(later.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn between_is_exclusive() {
        let mut t = table(5);
        for count in [10, 20, 30] {
            t.add_row(&row(&t, "Hx", "", count)).unwrap();
        }
        let hits = t
            .locate("sample_count", &Probe::pair(10, 30), Test::Between)
            .unwrap();
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn between_requires_pair() {
        let t = table(5);
        let err = t
            .locate("sample_count", &Probe::value(10), Test::Between)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        let err = t
            .locate("sample_count", &Probe::pair(1, 2), Test::Eq)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn strings_compare_exactly() {
        let mut t = table(5);
        t.add_row(&row(&t, "Ex", "", 1)).unwrap();
        assert!(t.locate("component", &Probe::value("ex"), Test::Eq).unwrap().is_empty());
        assert_eq!(t.locate("component", &Probe::value("Ex"), Test::Eq).unwrap().len(), 1);
    }

    #[test]
    fn unknown_field_is_not_found() {
        let t = table(5);
        let err = t.locate("kind", &Probe::value("x"), Test::Eq).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn tombstone_keeps_other_indices() {
        let mut t = table(5);
        for (component, count) in [("Ex", 1), ("Ey", 2), ("Hx", 3)] {
            t.add_row(&row(&t, component, "", count)).unwrap();
        }
        t.remove_row(1).unwrap();

        assert_eq!(t.row_count().unwrap(), 3);
        assert_eq!(t.row_state(1).unwrap(), RowState::Tombstoned);
        assert!(t.locate("component", &Probe::value("Ey"), Test::Eq).unwrap().is_empty());
        assert!(t.locate("component", &Probe::value("Hx"), Test::Eq).unwrap().contains(&2));
        assert!(t.locate("component", &Probe::value(""), Test::Eq).unwrap().contains(&1));
        assert_eq!(t.live_rows().unwrap().len(), 2);

        t.remove_row(1).unwrap();
        assert!(matches!(t.remove_row(9).unwrap_err(), Error::NotFound { .. }));
    }

    #[test]
    fn overwrite_refuses_tombstones() {
        let mut t = table(5);
        t.add_row(&row(&t, "Ex", "", 1)).unwrap();
        t.overwrite_row(0, &row(&t, "Ex", "", 5)).unwrap();
        assert_eq!(t.row(0).unwrap().get("sample_count"), Some(&Cell::I32(5)));

        t.remove_row(0).unwrap();
        let err = t.overwrite_row(0, &row(&t, "Ex", "", 6)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn display_renders_grid() {
        let mut t = table(5);
        t.add_row(&row(&t, "Ex", "", 1)).unwrap();
        t.add_row(&row(&t, "Hy", "", 2)).unwrap();
        t.remove_row(1).unwrap();
        let text = t.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("index | component"));
        assert!(lines[2].contains("Ex") && lines[2].contains("<reference>"));
        assert!(lines[3].starts_with('1'));
        assert!(!lines[3].contains("Hy") && !lines[3].contains("<reference>"));
    }

    #[test]
    fn tables_compare_structurally() {
        let mut a = table(5);
        let mut b = SummaryTable::open("other", MemTableStorage::new(run_layout(), 9)).unwrap();
        assert!(a == b);
        a.add_row(&row(&a, "Ex", "", 1)).unwrap();
        assert!(a != b);
        b.add_row(&row(&b, "Ex", "", 1)).unwrap();
        assert!(a == b);
    }
}
