//! Year-bucketed collection point for worker results.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Workers push `(year, record)` pairs concurrently; the stage drains the
/// buckets once the pool is done. Insertion order within a year follows
/// completion order, matching what a merge-on-write stage file expects.
pub struct YearAggregate<T> {
    buckets: Mutex<BTreeMap<String, Vec<T>>>,
}

impl<T> YearAggregate<T> {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn push(&self, year: String, item: T) {
        self.buckets.lock().unwrap().entry(year).or_default().push(item);
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<T>> {
        self.buckets.into_inner().unwrap()
    }
}

impl<T> Default for YearAggregate<T> {
    fn default() -> Self {
        Self::new()
    }
}
