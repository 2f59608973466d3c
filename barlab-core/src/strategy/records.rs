//! Auxiliary series recorded by strategies, keyed by bar timestamp.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Named numeric series. Column and row order are both sorted, so exports
/// are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    series: BTreeMap<String, BTreeMap<NaiveDateTime, f64>>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` at `timestamp`, overwriting any earlier value for that bar.
    pub fn record(&mut self, name: &str, timestamp: NaiveDateTime, value: f64) {
        self.series
            .entry(name.to_string())
            .or_default()
            .insert(timestamp, value);
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn series(&self, name: &str) -> Option<&BTreeMap<NaiveDateTime, f64>> {
        self.series.get(name)
    }

    /// Wide rows: one per timestamp that has any value, one cell per series.
    pub fn rows(&self) -> Vec<(NaiveDateTime, Vec<Option<f64>>)> {
        let timestamps: BTreeSet<NaiveDateTime> = self
            .series
            .values()
            .flat_map(|s| s.keys().copied())
            .collect();
        timestamps
            .into_iter()
            .map(|ts| {
                let cells = self.series.values().map(|s| s.get(&ts).copied()).collect();
                (ts, cells)
            })
            .collect()
    }
}
