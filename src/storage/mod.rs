//! Storage module for persisting the catalog
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Catalog entry upserts, lookups and tombstone deletes
//! - Thumbnail backfill writes
//! - Scan run history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{CatalogStore, StorageError, StorageResult};

use crate::container::ContainerKind;
use serde::{Serialize, Serializer};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Store handle shared by scan workers and the read path
pub type SharedStore<S> = Arc<Mutex<S>>;

/// Locks a shared store, mapping poisoning to a storage error
pub fn lock_store<S>(store: &Mutex<S>) -> StorageResult<MutexGuard<'_, S>> {
    store.lock().map_err(|_| StorageError::Poisoned)
}

/// Opens or creates the catalog database at `path`
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Reference to the page chosen as a container's cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverRef {
    /// A page of a directory container, re-resolvable on demand
    Page(String),
    /// Cover lives inside an archive and was resolved at scan time
    ArchiveInternal(ContainerKind),
    /// No cover could be chosen
    Missing,
}

impl CoverRef {
    pub fn to_db_string(&self) -> String {
        match self {
            Self::Page(page) => page.clone(),
            Self::ArchiveInternal(ContainerKind::Rar) => "(cbr internal)".to_string(),
            Self::ArchiveInternal(_) => "(cbz internal)".to_string(),
            Self::Missing => String::new(),
        }
    }

    pub fn from_db_string(s: &str) -> Self {
        match s {
            "" => Self::Missing,
            "(cbz internal)" => Self::ArchiveInternal(ContainerKind::Zip),
            "(cbr internal)" => Self::ArchiveInternal(ContainerKind::Rar),
            page => Self::Page(page.to_string()),
        }
    }

    /// Page identifier when the cover can be re-read later
    pub fn page(&self) -> Option<&str> {
        match self {
            Self::Page(page) => Some(page),
            _ => None,
        }
    }
}

impl Serialize for CoverRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_db_string())
    }
}

/// One cataloged library item
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: i64,
    pub path: String,
    pub category: String,
    pub title: String,
    pub cover: CoverRef,
    /// Data URI, empty when generation failed or is pending
    pub cover_thumbnail: String,
    pub last_modified: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Values written by an upsert; the store owns `id` and bookkeeping times
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub path: String,
    pub category: String,
    pub title: String,
    pub cover: CoverRef,
    pub cover_thumbnail: String,
    pub last_modified: String,
}

/// Counters recorded for a finished scan pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
}

/// Represents a scan pass in the run history
#[derive(Debug, Clone)]
pub struct ScanRunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counts: RunCounts,
}

/// Status of a scan run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
