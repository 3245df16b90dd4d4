//! Storage traits and error types
//!
//! This module defines the trait interface for catalog backends and
//! associated error types.

use crate::storage::{CatalogEntry, EntryDraft, RunCounts, RunStatus, ScanRunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Store lock poisoned by a panicked writer")]
    Poisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for catalog backend implementations
///
/// Callers share a store behind a mutex; writers are serialized by it and the
/// backend only has to be `Send`.
pub trait CatalogStore: Send {
    // ===== Catalog Entries =====

    /// Returns every `(path, last_modified)` pair in the catalog
    fn list_all(&self) -> StorageResult<Vec<(String, String)>>;

    /// Inserts a new entry or updates the one with the same path
    ///
    /// # Returns
    ///
    /// The entry ID, stable across updates
    fn upsert(&mut self, entry: &EntryDraft) -> StorageResult<i64>;

    /// Deletes the entry for `path`, returning whether a row was removed
    fn delete(&mut self, path: &str) -> StorageResult<bool>;

    /// Gets an entry by path
    fn query_by_path(&self, path: &str) -> StorageResult<Option<CatalogEntry>>;

    /// Gets an entry by ID
    fn query_by_id(&self, id: i64) -> StorageResult<CatalogEntry>;

    /// Gets all entries ordered by title
    fn list_entries(&self) -> StorageResult<Vec<CatalogEntry>>;

    /// Stores a backfilled thumbnail without touching modification data
    fn set_thumbnail(&mut self, id: i64, thumbnail: &str) -> StorageResult<()>;

    // ===== Scan Runs =====

    /// Records the start of a scan pass
    fn begin_scan_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Records the outcome of a scan pass
    fn finish_scan_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: &RunCounts,
    ) -> StorageResult<()>;

    /// Gets the most recent scan pass
    fn latest_scan_run(&self) -> StorageResult<Option<ScanRunRecord>>;

    // ===== Statistics =====

    fn count_entries(&self) -> StorageResult<u64>;

    /// Entry counts per category, largest first
    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>>;

    fn count_missing_thumbnails(&self) -> StorageResult<u64>;
}
