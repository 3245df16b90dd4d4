use crate::state::ItemChange;
use crate::storage::RunCounts;
use std::collections::{HashMap, HashSet};

/// Modification times recorded in the catalog when a pass starts
#[derive(Debug, Clone, Default)]
pub struct ScanSnapshot {
    recorded: HashMap<String, String>,
}

impl ScanSnapshot {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            recorded: pairs.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }

    /// Compares an item's current modification time with the recorded one
    pub fn change_for(&self, path: &str, last_modified: &str) -> ItemChange {
        ItemChange::classify(self.recorded.get(path).map(String::as_str), last_modified)
    }

    /// Recorded paths that were not seen during the pass, in sorted order
    pub fn tombstones(&self, seen: &HashSet<String>) -> Vec<String> {
        let mut gone: Vec<String> = self
            .recorded
            .keys()
            .filter(|path| !seen.contains(*path))
            .cloned()
            .collect();
        gone.sort();
        gone
    }
}

/// What a pass has observed and committed so far
///
/// Shared by all workers of one pass behind a single mutex; store writes for
/// an item happen while that mutex is held so the counters and the catalog
/// never disagree.
#[derive(Debug, Default)]
pub struct PassLedger {
    seen: HashSet<String>,
    counts: RunCounts,
}

impl PassLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_seen(&mut self, path: &str) {
        self.seen.insert(path.to_string());
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    /// Counts a committed store write for a new or updated item
    pub fn record_commit(&mut self, change: ItemChange) {
        match change {
            ItemChange::New => self.counts.created += 1,
            ItemChange::Updated => self.counts.updated += 1,
            ItemChange::Unchanged => {}
        }
    }

    pub fn record_delete(&mut self) {
        self.counts.deleted += 1;
    }

    pub fn counts(&self) -> RunCounts {
        self.counts
    }
}
