//! Scan coordinator - one reconciliation pass between disk and catalog

use crate::config::Config;
use crate::container::Container;
use crate::scanner::discovery::discover_into;
use crate::scanner::item::{path_key, plan_item, render_cover};
use crate::scanner::ScanReport;
use crate::state::{ItemChange, PassLedger, ScanSnapshot};
use crate::storage::{lock_store, CatalogStore, EntryDraft, RunCounts, RunStatus, SharedStore};
use crate::CatalogError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// Sizing of a scan pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub workers: usize,
    pub queue_capacity: usize,
    pub max_dimension: u32,
}

impl ScanSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.scan.workers.max(1),
            queue_capacity: config.scan.queue_capacity.max(1),
            max_dimension: config.thumbnail.max_dimension,
        }
    }
}

/// Runs scan passes against a shared catalog store
///
/// The coordinator does not serialize passes itself; callers that may start
/// passes concurrently go through [`crate::Library`].
pub struct ScanCoordinator<S: CatalogStore> {
    roots: Vec<PathBuf>,
    settings: ScanSettings,
    store: SharedStore<S>,
    gate: Arc<Semaphore>,
    config_hash: String,
}

impl<S: CatalogStore + 'static> ScanCoordinator<S> {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `roots` - Library roots, already validated to exist
    /// * `settings` - Worker pool and queue sizing
    /// * `store` - Catalog store shared with the read path
    /// * `gate` - Thumbnail concurrency gate
    /// * `config_hash` - Recorded with every scan run
    pub fn new(
        roots: Vec<PathBuf>,
        settings: ScanSettings,
        store: SharedStore<S>,
        gate: Arc<Semaphore>,
        config_hash: impl Into<String>,
    ) -> Self {
        Self {
            roots,
            settings,
            store,
            gate,
            config_hash: config_hash.into(),
        }
    }

    /// Runs one complete pass and records it in the run history
    ///
    /// Per-item failures are logged and never fail the pass. The pass fails
    /// with `StoreUnavailable` only when the catalog cannot be read or the
    /// run cannot be recorded.
    pub async fn run_pass(&self) -> Result<ScanReport, CatalogError> {
        let started = Instant::now();

        let run_id = {
            let mut store = lock_store(&self.store).map_err(store_unavailable)?;
            store
                .begin_scan_run(&self.config_hash)
                .map_err(store_unavailable)?
        };
        tracing::info!("Scan run {} started over {} roots", run_id, self.roots.len());

        match self.reconcile().await {
            Ok((counts, peak_renders)) => {
                self.finish_run(run_id, RunStatus::Completed, &counts);
                let report = ScanReport {
                    run_id,
                    counts,
                    duration: started.elapsed(),
                    peak_renders,
                };
                tracing::info!("Scan run {} finished: {}", run_id, report);
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Scan run {} failed: {}", run_id, e);
                self.finish_run(run_id, RunStatus::Failed, &RunCounts::default());
                Err(e)
            }
        }
    }

    /// Snapshot, discovery, workers, barrier, tombstone sweep
    ///
    /// Returns the pass counters and the peak number of simultaneous
    /// thumbnail renders.
    async fn reconcile(&self) -> Result<(RunCounts, usize), CatalogError> {
        let recorded = {
            let store = lock_store(&self.store).map_err(store_unavailable)?;
            store.list_all().map_err(store_unavailable)?
        };
        let snapshot = Arc::new(ScanSnapshot::new(recorded));
        tracing::debug!("Snapshot holds {} cataloged items", snapshot.len());

        let pass = Arc::new(PassContext {
            snapshot: Arc::clone(&snapshot),
            ledger: Mutex::new(PassLedger::new()),
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            renders: Arc::new(RenderGauge::default()),
            max_dimension: self.settings.max_dimension,
        });

        let (queue, receiver) = mpsc::channel(self.settings.queue_capacity);
        let roots = self.roots.clone();
        let producer = tokio::task::spawn_blocking(move || discover_into(&roots, queue));

        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let workers: Vec<JoinHandle<usize>> = (0..self.settings.workers)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let pass = Arc::clone(&pass);
                tokio::spawn(async move {
                    let mut handled = 0;
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(container) = next else { break };
                        pass.process(container).await;
                        handled += 1;
                    }
                    handled
                })
            })
            .collect();

        // Completion barrier: discovery done and every queued item handled
        let discovered = producer
            .await
            .map_err(|e| CatalogError::Task(e.to_string()))?;
        let mut handled = 0;
        for worker in workers {
            handled += worker
                .await
                .map_err(|e| CatalogError::Task(e.to_string()))?;
        }
        tracing::debug!("Discovered {} containers, {} handled", discovered, handled);

        let counts = pass.sweep()?;
        let peak_renders = pass.renders.peak();
        tracing::debug!("Peak concurrent thumbnail renders: {}", peak_renders);
        Ok((counts, peak_renders))
    }

    fn finish_run(&self, run_id: i64, status: RunStatus, counts: &RunCounts) {
        let result = lock_store(&self.store)
            .and_then(|mut store| store.finish_scan_run(run_id, status, counts));
        if let Err(e) = result {
            tracing::error!("Failed to record end of scan run {}: {}", run_id, e);
        }
    }
}

/// State shared by the workers of one pass
struct PassContext<S: CatalogStore> {
    snapshot: Arc<ScanSnapshot>,
    ledger: Mutex<PassLedger>,
    store: SharedStore<S>,
    gate: Arc<Semaphore>,
    renders: Arc<RenderGauge>,
    max_dimension: u32,
}

/// Counts thumbnail renders in flight and the most seen at once
#[derive(Debug, Default)]
struct RenderGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RenderGauge {
    fn enter(&self) -> RenderSlot<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        RenderSlot(self)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// One render in flight; leaves the gauge when dropped
struct RenderSlot<'a>(&'a RenderGauge);

impl Drop for RenderSlot<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<S: CatalogStore + 'static> PassContext<S> {
    async fn process(self: &Arc<Self>, container: Container) {
        let key = path_key(container.path());
        if !self.mark_seen(&key) {
            return;
        }

        let snapshot = Arc::clone(&self.snapshot);
        let plan = match tokio::task::spawn_blocking(move || plan_item(container, &snapshot)).await
        {
            Ok(Some(plan)) => plan,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Worker task failed for {}: {}", key, e);
                return;
            }
        };

        let thumbnail = match plan.cover_page.clone() {
            Some(page) => self.render(plan.container.clone(), page).await,
            None => String::new(),
        };

        let change = plan.change;
        let draft = plan.into_draft(thumbnail);
        let pass = Arc::clone(self);
        if let Err(e) = tokio::task::spawn_blocking(move || pass.commit(change, draft)).await {
            tracing::error!("Commit task failed for {}: {}", key, e);
        }
    }

    fn mark_seen(&self, key: &str) -> bool {
        match lock_ledger(&self.ledger) {
            Ok(mut ledger) => {
                ledger.mark_seen(key);
                true
            }
            Err(e) => {
                tracing::error!("Cannot record {} as seen: {}", key, e);
                false
            }
        }
    }

    /// Renders a cover while holding a thumbnail gate permit
    async fn render(&self, container: Container, page: String) -> String {
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!("Thumbnail gate closed: {}", e);
                return String::new();
            }
        };

        let max_dimension = self.max_dimension;
        let path = path_key(container.path());
        let renders = Arc::clone(&self.renders);
        let task = move || {
            let _slot = renders.enter();
            render_cover(&container, &page, max_dimension)
        };
        match tokio::task::spawn_blocking(task).await {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!("Thumbnail task failed for {}: {}", path, e);
                String::new()
            }
        }
    }

    /// Writes one item and bumps its counter under the ledger lock
    fn commit(&self, change: ItemChange, draft: EntryDraft) {
        let mut ledger = match lock_ledger(&self.ledger) {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::error!("Failed to write {}: {}", draft.path, e);
                return;
            }
        };

        let written = lock_store(&self.store).and_then(|mut store| store.upsert(&draft));
        match written {
            Ok(id) => {
                ledger.record_commit(change);
                tracing::debug!("Cataloged {} as entry {} ({})", draft.path, id, change);
            }
            Err(e) => tracing::error!("Failed to write {}: {}", draft.path, e),
        }
    }

    /// Deletes every snapshot entry the pass did not see
    fn sweep(&self) -> Result<RunCounts, CatalogError> {
        let mut ledger =
            lock_ledger(&self.ledger).map_err(|e| CatalogError::Task(e.to_string()))?;
        let tombstones = self.snapshot.tombstones(ledger.seen());
        if tombstones.is_empty() {
            return Ok(ledger.counts());
        }

        let mut store = lock_store(&self.store).map_err(store_unavailable)?;
        for path in tombstones {
            match store.delete(&path) {
                Ok(true) => {
                    ledger.record_delete();
                    tracing::debug!("Removed {}", path);
                }
                Ok(false) => tracing::debug!("Already removed: {}", path),
                Err(e) => tracing::error!("Failed to delete {}: {}", path, e),
            }
        }

        Ok(ledger.counts())
    }
}

fn lock_ledger(ledger: &Mutex<PassLedger>) -> Result<MutexGuard<'_, PassLedger>, &'static str> {
    ledger.lock().map_err(|_| "pass ledger poisoned")
}

fn store_unavailable(err: impl std::fmt::Display) -> CatalogError {
    CatalogError::StoreUnavailable(err.to_string())
}
