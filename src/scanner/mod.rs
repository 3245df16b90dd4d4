//! Scan passes over the configured library roots
//!
//! A pass snapshots the catalog, walks every root on a blocking producer,
//! feeds discovered containers through a bounded queue to a fixed pool of
//! workers, and finally sweeps entries that were not seen.

mod coordinator;
mod discovery;
mod item;

pub use coordinator::{ScanCoordinator, ScanSettings};
pub use discovery::{discover_all, walk_roots};
pub use item::{modified_stamp, path_key, render_cover};

use crate::storage::RunCounts;
use std::fmt;
use std::time::Duration;

/// Outcome of one completed scan pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanReport {
    pub run_id: i64,
    pub counts: RunCounts,
    pub duration: Duration,
    /// Most thumbnail renders that ran at the same time
    pub peak_renders: usize,
}

impl ScanReport {
    pub fn created(&self) -> u64 {
        self.counts.created
    }

    pub fn updated(&self) -> u64 {
        self.counts.updated
    }

    pub fn deleted(&self) -> u64 {
        self.counts.deleted
    }

    /// Returns true if the pass changed nothing
    pub fn is_noop(&self) -> bool {
        self.counts == RunCounts::default()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} updated, {} removed in {:.2?}",
            self.counts.created, self.counts.updated, self.counts.deleted, self.duration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let report = ScanReport {
            run_id: 1,
            counts: RunCounts {
                created: 3,
                updated: 1,
                deleted: 2,
            },
            duration: Duration::from_millis(1500),
            peak_renders: 2,
        };
        assert_eq!(report.to_string(), "3 new, 1 updated, 2 removed in 1.50s");
        assert!(!report.is_noop());
    }
}
