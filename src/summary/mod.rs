//! Categorical counts over already-fetched entities.
//!
//! Every scanned entity counts toward `total`. Entities the classifier
//! cannot place are counted as `unclassified` instead of being dropped, so
//! `bucket_sum() + unclassified == total` for every summary.

mod classify;
mod rollup;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::Entity;

pub use classify::{
    summarize_issues, summarize_smart_list, CrossTabStatus, IssueClass, IssuePriority, IssueStatus, IssueSummary,
    ListStatus, Priority, SmartListClass, SmartListSummary,
};
pub use rollup::{
    action_item_counts, completion_averages, system_progress, ActionItemCounts, CompletionAverages,
};

/// Counts per bucket key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary<K: Ord> {
    pub buckets: BTreeMap<K, usize>,
    pub total: usize,
    pub unclassified: usize,
}

impl<K: Ord> Default for Summary<K> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
            total: 0,
            unclassified: 0,
        }
    }
}

impl<K: Ord> Summary<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one entity. `None` means it could not be classified.
    pub fn record(&mut self, key: Option<K>) {
        self.total += 1;
        match key {
            Some(key) => *self.buckets.entry(key).or_insert(0) += 1,
            None => self.unclassified += 1,
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.buckets.get(key).copied().unwrap_or(0)
    }

    pub fn bucket_sum(&self) -> usize {
        self.buckets.values().sum()
    }

    /// Re-bucket by a coarser key, e.g. `(priority, status)` to `status`.
    pub fn rollup<J: Ord>(&self, coarsen: impl Fn(&K) -> J) -> BTreeMap<J, usize> {
        let mut rolled = BTreeMap::new();
        for (key, count) in &self.buckets {
            *rolled.entry(coarsen(key)).or_insert(0) += count;
        }
        rolled
    }
}

/// Bucket `entities` with `classify` in a single pass.
pub fn summarize<K, F>(entities: &[Entity], classify: F) -> Summary<K>
where
    K: Ord,
    F: Fn(&Entity) -> Option<K>,
{
    let mut summary = Summary::new();
    for entity in entities {
        summary.record(classify(entity));
    }
    summary
}

/// Running open/closed totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub open: usize,
    pub closed: usize,
}

impl Tally {
    pub fn record(&mut self, closed: bool) {
        if closed {
            self.closed += 1;
        } else {
            self.open += 1;
        }
    }

    pub fn add(&mut self, open: usize, closed: usize) {
        self.open += open;
        self.closed += closed;
    }

    pub fn total(&self) -> usize {
        self.open + self.closed
    }
}
