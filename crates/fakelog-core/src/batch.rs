use serde::Serialize;

use crate::record::Record;

/// Default upper bound on the number of records kept in a batch.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// An ordered, size-capped collection of records.
///
/// A `Batch` can only be built through [`Batch::from_records`], which sorts by
/// timestamp (stable) and truncates to the cap, so every value satisfies both
/// invariants.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    pub fn from_records(mut records: Vec<Record>, max_rows: usize) -> Self {
        records.sort_by_key(|record| record.timestamp);
        records.truncate(max_rows);
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
