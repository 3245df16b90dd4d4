//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CatalogStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CatalogStore, StorageError, StorageResult};
use crate::storage::{CatalogEntry, CoverRef, EntryDraft, RunCounts, RunStatus, ScanRunRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const ENTRY_COLUMNS: &str = "id, path, category, title, cover, cover_data, last_modified, created_at, updated_at";

/// SQLite catalog backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the catalog database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        path: row.get(1)?,
        category: row.get(2)?,
        title: row.get(3)?,
        cover: CoverRef::from_db_string(&row.get::<_, String>(4)?),
        cover_thumbnail: row.get(5)?,
        last_modified: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<ScanRunRecord> {
    Ok(ScanRunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
        counts: RunCounts {
            created: row.get::<_, i64>(5)? as u64,
            updated: row.get::<_, i64>(6)? as u64,
            deleted: row.get::<_, i64>(7)? as u64,
        },
    })
}

impl CatalogStore for SqliteStore {
    // ===== Catalog Entries =====

    fn list_all(&self) -> StorageResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, last_modified FROM library")?;

        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pairs)
    }

    fn upsert(&mut self, entry: &EntryDraft) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO library (category, title, path, cover, cover_data, last_modified, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(path) DO UPDATE SET
                category = excluded.category,
                title = excluded.title,
                cover = excluded.cover,
                cover_data = excluded.cover_data,
                last_modified = excluded.last_modified,
                updated_at = excluded.updated_at",
            params![
                entry.category,
                entry.title,
                entry.path,
                entry.cover.to_db_string(),
                entry.cover_thumbnail,
                entry.last_modified,
                now
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM library WHERE path = ?1",
            params![entry.path],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn delete(&mut self, path: &str) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM library WHERE path = ?1", params![path])?;
        Ok(removed > 0)
    }

    fn query_by_path(&self, path: &str) -> StorageResult<Option<CatalogEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {} FROM library WHERE path = ?1", ENTRY_COLUMNS),
                params![path],
                entry_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    fn query_by_id(&self, id: i64) -> StorageResult<CatalogEntry> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM library WHERE id = ?1", ENTRY_COLUMNS),
                params![id],
                entry_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("Entry ID {}", id)))
    }

    fn list_entries(&self) -> StorageResult<Vec<CatalogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM library ORDER BY title, id",
            ENTRY_COLUMNS
        ))?;

        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn set_thumbnail(&mut self, id: i64, thumbnail: &str) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE library SET cover_data = ?1 WHERE id = ?2",
            params![thumbnail, id],
        )?;

        if changed == 0 {
            return Err(StorageError::NotFound(format!("Entry ID {}", id)));
        }
        Ok(())
    }

    // ===== Scan Runs =====

    fn begin_scan_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO scan_runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_scan_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: &RunCounts,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE scan_runs SET status = ?1, finished_at = ?2, created = ?3, updated = ?4, deleted = ?5
             WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                counts.created as i64,
                counts.updated as i64,
                counts.deleted as i64,
                run_id
            ],
        )?;
        Ok(())
    }

    fn latest_scan_run(&self) -> StorageResult<Option<ScanRunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, created, updated, deleted
                 FROM scan_runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Statistics =====

    fn count_entries(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM library", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS n FROM library GROUP BY category ORDER BY n DESC, category",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn count_missing_thumbnails(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM library WHERE cover_data = ''",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
