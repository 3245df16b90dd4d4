//! The library context object
//!
//! `Library` is built once from the configuration and owns everything a scan
//! pass or a read needs: canonical roots, the shared catalog store, the
//! thumbnail gate and the lock that keeps passes from overlapping.

mod backfill;

pub use backfill::{Backfill, BackfillJob};

use crate::config::Config;
use crate::container::{Container, PageData};
use crate::paths::authorize;
use crate::scanner::{discover_all, ScanCoordinator, ScanReport, ScanSettings};
use crate::storage::{lock_store, open_store, CatalogEntry, CatalogStore, SharedStore, SqliteStore};
use crate::{CatalogError, ConfigError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Catalog of one set of library roots
pub struct Library<S: CatalogStore = SqliteStore> {
    config: Config,
    roots: Vec<PathBuf>,
    store: SharedStore<S>,
    coordinator: ScanCoordinator<S>,
    backfill: Backfill<S>,
    scan_lock: tokio::sync::Mutex<()>,
}

impl Library<SqliteStore> {
    /// Opens the catalog database named by the configuration
    pub fn open(config: Config, config_hash: &str) -> Result<Self> {
        let store = open_store(&config.cache.database_path).map_err(|e| {
            CatalogError::StoreUnavailable(format!(
                "{}: {}",
                config.cache.database_path.display(),
                e
            ))
        })?;
        Self::from_parts(config, store, config_hash)
    }
}

impl<S: CatalogStore + 'static> Library<S> {
    /// Builds a library around an already opened store
    ///
    /// Roots are canonicalized so scanned paths and guarded paths agree.
    pub fn from_parts(config: Config, store: S, config_hash: &str) -> Result<Self> {
        let roots = canonical_roots(&config.library.roots)?;
        let store: SharedStore<S> = Arc::new(Mutex::new(store));
        let gate = Arc::new(Semaphore::new(config.scan.thumbnail_permits.max(1)));

        let coordinator = ScanCoordinator::new(
            roots.clone(),
            ScanSettings::from_config(&config),
            Arc::clone(&store),
            Arc::clone(&gate),
            config_hash,
        );
        let backfill = Backfill::new(
            Arc::clone(&store),
            gate,
            config.thumbnail.max_dimension,
        );

        Ok(Self {
            config,
            roots,
            store,
            coordinator,
            backfill,
            scan_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonical library roots, in configuration order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn store(&self) -> &SharedStore<S> {
        &self.store
    }

    /// Runs a full scan pass, waiting for any pass already in progress
    pub async fn trigger_scan(&self) -> Result<ScanReport> {
        let _pass = self.scan_lock.lock().await;
        self.coordinator.run_pass().await
    }

    /// Runs a scan pass unless one is already in progress
    ///
    /// Returns `Ok(None)` when skipped. Used by the refresh timer.
    pub async fn try_trigger_scan(&self) -> Result<Option<ScanReport>> {
        let Ok(_pass) = self.scan_lock.try_lock() else {
            tracing::info!("Scan already in progress, skipping refresh");
            return Ok(None);
        };
        self.coordinator.run_pass().await.map(Some)
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_lock.try_lock().is_err()
    }

    /// Waits until no scan pass is running
    pub async fn wait_idle(&self) {
        drop(self.scan_lock.lock().await);
    }

    /// Lists the containers a pass would visit, without touching the catalog
    pub fn discover(&self) -> Vec<Container> {
        discover_all(&self.roots)
    }

    /// All cataloged entries ordered by title
    ///
    /// Directory entries with no thumbnail get one regenerated in the
    /// background; the returned rows are never delayed by that.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>> {
        let entries = lock_store(&self.store)?.list_entries()?;
        self.backfill.dispatch(&entries);
        Ok(entries)
    }

    pub fn entry(&self, id: i64) -> Result<CatalogEntry> {
        Ok(lock_store(&self.store)?.query_by_id(id)?)
    }

    /// Lists the pages of a cataloged entry
    pub fn entry_pages(&self, id: i64) -> Result<Vec<String>> {
        let entry = self.entry(id)?;
        self.list_pages(Path::new(&entry.path))
    }

    /// Lists the pages of the container at `path`
    pub fn list_pages(&self, path: &Path) -> Result<Vec<String>> {
        let container = self.open_container(path)?;
        Ok(container.list_pages()?)
    }

    /// Reads one page of the container at `path`
    pub fn read_page(&self, path: &Path, page: &str) -> Result<PageData> {
        let container = self.open_container(path)?;
        Ok(container.read_page(page)?)
    }

    fn open_container(&self, path: &Path) -> Result<Container> {
        let allowed = authorize(path, &self.roots).map_err(|e| {
            tracing::warn!("Rejected access outside libraries: {}", path.display());
            e
        })?;
        Ok(Container::open(&allowed)?)
    }
}

fn canonical_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    roots
        .iter()
        .map(|root| {
            root.canonicalize()
                .map_err(|_| CatalogError::Config(ConfigError::MissingRoot(root.clone())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::container::test_support::png_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn library(root: &Path) -> Library {
        let toml = format!(
            "[library]\nroots = [\"{}\"]\n\n[thumbnail]\nmax-dimension = 32\n",
            root.display()
        );
        let config = parse_config(&toml).unwrap();
        Library::from_parts(config, SqliteStore::new_in_memory().unwrap(), "hash").unwrap()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let issue = dir.path().join("Batman").join("Batman #1");
        fs::create_dir_all(&issue).unwrap();
        fs::write(issue.join("002.png"), png_bytes(8, 12)).unwrap();
        fs::write(issue.join("cover.png"), png_bytes(8, 12)).unwrap();
        fs::write(issue.join("001.png"), png_bytes(8, 12)).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_trigger_scan_and_entries() {
        let dir = fixture();
        let lib = library(dir.path());

        let report = lib.trigger_scan().await.unwrap();
        assert_eq!(report.created(), 1);

        let entries = lib.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Batman #1");

        let pages = lib.entry_pages(entries[0].id).unwrap();
        assert_eq!(pages, vec!["001.png", "002.png", "cover.png"]);
    }

    #[tokio::test]
    async fn test_try_trigger_skips_while_busy() {
        let dir = fixture();
        let lib = library(dir.path());

        let held = lib.scan_lock.lock().await;
        assert!(lib.is_scanning());
        assert!(lib.try_trigger_scan().await.unwrap().is_none());
        drop(held);

        assert!(!lib.is_scanning());
        assert!(lib.try_trigger_scan().await.unwrap().is_some());
    }

    #[test]
    fn test_read_page_inside_root() {
        let dir = fixture();
        let lib = library(dir.path());
        let issue = lib.roots()[0].join("Batman").join("Batman #1");

        let page = lib.read_page(&issue, "cover.png").unwrap();
        assert_eq!(page.content_type, "image/png");
        assert!(!page.bytes.is_empty());
    }

    #[test]
    fn test_read_path_rejects_traversal() {
        let dir = fixture();
        let lib = library(dir.path());
        let escape = lib.roots()[0].join("..").join("..").join("etc");

        let err = lib.list_pages(&escape).unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized { .. }));
        let err = lib.read_page(Path::new("/etc"), "passwd.png").unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized { .. }));
    }

    #[test]
    fn test_missing_page_is_typed() {
        let dir = fixture();
        let lib = library(dir.path());
        let issue = lib.roots()[0].join("Batman").join("Batman #1");

        let err = lib.read_page(&issue, "999.png").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Container(crate::ContainerError::PageNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_root() {
        let config: Config = toml::from_str("[library]\nroots = [\"/no/such/root\"]\n").unwrap();
        let err = Library::from_parts(config, SqliteStore::new_in_memory().unwrap(), "h");
        assert!(matches!(
            err,
            Err(CatalogError::Config(ConfigError::MissingRoot(_)))
        ));
    }

    #[test]
    fn test_entry_not_found() {
        let dir = fixture();
        let lib = library(dir.path());
        assert!(matches!(lib.entry(42), Err(CatalogError::Storage(_))));
    }
}
