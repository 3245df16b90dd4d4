//! Background thumbnail backfill triggered by listings

use crate::container::{Container, ContainerKind};
use crate::scanner::render_cover;
use crate::storage::{lock_store, CatalogEntry, CatalogStore, SharedStore};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Regenerates missing directory thumbnails off the read path
///
/// Each job runs through the thumbnail gate. Entries already being
/// backfilled are not queued twice.
pub struct Backfill<S: CatalogStore> {
    store: SharedStore<S>,
    gate: Arc<Semaphore>,
    max_dimension: u32,
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

/// Entry that lacks a thumbnail but has a re-readable cover page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillJob {
    pub id: i64,
    pub path: PathBuf,
    pub page: String,
}

impl BackfillJob {
    pub fn for_entry(entry: &CatalogEntry) -> Option<Self> {
        if !entry.cover_thumbnail.is_empty() {
            return None;
        }
        let page = entry.cover.page()?;
        Some(Self {
            id: entry.id,
            path: PathBuf::from(&entry.path),
            page: page.to_string(),
        })
    }
}

impl<S: CatalogStore + 'static> Backfill<S> {
    pub fn new(store: SharedStore<S>, gate: Arc<Semaphore>, max_dimension: u32) -> Self {
        Self {
            store,
            gate,
            max_dimension,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Dispatches fire-and-forget jobs for every entry that needs one
    ///
    /// Returns the number of jobs started. Nothing is started outside a
    /// tokio runtime.
    pub fn dispatch(&self, entries: &[CatalogEntry]) -> usize {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime available, skipping thumbnail backfill");
            return 0;
        };

        let mut started = 0;
        for job in entries.iter().filter_map(BackfillJob::for_entry) {
            if !self.claim(job.id) {
                continue;
            }
            runtime.spawn(run_job(
                job,
                Arc::clone(&self.store),
                Arc::clone(&self.gate),
                self.max_dimension,
                Arc::clone(&self.in_flight),
            ));
            started += 1;
        }

        if started > 0 {
            tracing::debug!("Started {} thumbnail backfill jobs", started);
        }
        started
    }

    fn claim(&self, id: i64) -> bool {
        match self.in_flight.lock() {
            Ok(mut in_flight) => in_flight.insert(id),
            Err(_) => false,
        }
    }
}

async fn run_job<S: CatalogStore + 'static>(
    job: BackfillJob,
    store: SharedStore<S>,
    gate: Arc<Semaphore>,
    max_dimension: u32,
    in_flight: Arc<Mutex<HashSet<i64>>>,
) {
    let id = job.id;

    match gate.acquire_owned().await {
        Ok(permit) => {
            let result = tokio::task::spawn_blocking(move || {
                let container = Container::new(ContainerKind::Directory, &job.path);
                let uri = render_cover(&container, &job.page, max_dimension);
                drop(permit);

                if uri.is_empty() {
                    return;
                }
                let written =
                    lock_store(&store).and_then(|mut store| store.set_thumbnail(job.id, &uri));
                match written {
                    Ok(()) => tracing::debug!("Backfilled thumbnail for {}", job.path.display()),
                    Err(e) => tracing::warn!(
                        "Failed to store thumbnail for {}: {}",
                        job.path.display(),
                        e
                    ),
                }
            })
            .await;

            if let Err(e) = result {
                tracing::warn!("Backfill task for entry {} failed: {}", id, e);
            }
        }
        Err(e) => tracing::warn!("Thumbnail gate closed, skipping backfill: {}", e),
    }

    if let Ok(mut in_flight) = in_flight.lock() {
        in_flight.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerKind;
    use crate::storage::CoverRef;

    fn entry(cover: CoverRef, thumbnail: &str) -> CatalogEntry {
        CatalogEntry {
            id: 7,
            path: "/lib/Batman/Batman #1".to_string(),
            category: "Batman".to_string(),
            title: "Batman #1".to_string(),
            cover,
            cover_thumbnail: thumbnail.to_string(),
            last_modified: "2024-01-01T00:00:00Z".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_job_for_directory_without_thumbnail() {
        let job = BackfillJob::for_entry(&entry(CoverRef::Page("cover.jpg".into()), "")).unwrap();
        assert_eq!(job.id, 7);
        assert_eq!(job.page, "cover.jpg");
    }

    #[test]
    fn test_no_job_when_thumbnail_present() {
        let e = entry(CoverRef::Page("cover.jpg".into()), "data:image/jpeg;base64,AAAA");
        assert!(BackfillJob::for_entry(&e).is_none());
    }

    #[test]
    fn test_no_job_for_archives_or_missing_cover() {
        let archive = entry(CoverRef::ArchiveInternal(ContainerKind::Zip), "");
        assert!(BackfillJob::for_entry(&archive).is_none());
        assert!(BackfillJob::for_entry(&entry(CoverRef::Missing, "")).is_none());
    }
}
