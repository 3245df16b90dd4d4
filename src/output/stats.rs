//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::storage::{CatalogStore, ScanRunRecord, StorageResult};
use std::fmt::Write;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct LibraryStatistics {
    /// Total number of cataloged entries
    pub total_entries: u64,

    /// Entry count per category, largest first
    pub entries_by_category: Vec<(String, u64)>,

    /// Entries whose thumbnail is empty
    pub missing_thumbnails: u64,

    /// Most recent scan run, if any
    pub last_run: Option<ScanRunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(LibraryStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn CatalogStore) -> StorageResult<LibraryStatistics> {
    let total_entries = storage.count_entries()?;
    let missing_thumbnails = storage.count_missing_thumbnails()?;
    let last_run = storage.latest_scan_run()?;

    let mut entries_by_category = storage.count_by_category()?;
    entries_by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(LibraryStatistics {
        total_entries,
        entries_by_category,
        missing_thumbnails,
        last_run,
    })
}

/// Formats statistics as the text printed by the CLI
pub fn render_statistics(stats: &LibraryStatistics) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Library Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total entries: {}", stats.total_entries);
    let _ = writeln!(out, "  Categories: {}", stats.entries_by_category.len());
    let _ = writeln!(out, "  Missing thumbnails: {}", stats.missing_thumbnails);
    let _ = writeln!(out);

    if !stats.entries_by_category.is_empty() {
        let _ = writeln!(out, "Entries by Category:");
        for (category, count) in &stats.entries_by_category {
            let percentage = if stats.total_entries > 0 {
                (*count as f64 / stats.total_entries as f64) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "  {}: {} ({:.1}%)", category, count, percentage);
        }
        let _ = writeln!(out);
    }

    match &stats.last_run {
        Some(run) => {
            let _ = writeln!(out, "Last Scan Run #{}:", run.id);
            let _ = writeln!(out, "  Status: {}", run.status.to_db_string());
            let _ = writeln!(out, "  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                let _ = writeln!(out, "  Finished: {}", finished);
            }
            let _ = writeln!(
                out,
                "  Changes: {} new, {} updated, {} removed",
                run.counts.created, run.counts.updated, run.counts.deleted
            );
        }
        None => {
            let _ = writeln!(out, "No scan runs recorded yet");
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &LibraryStatistics) {
    print!("{}", render_statistics(stats));
}
