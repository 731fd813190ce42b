//! The externally-facing controller for sync runs.
//!
//! The coordinator computes the work set, owns the running/cancel flags,
//! drives the worker future together with its event stream, and translates
//! events into host callbacks. Each public operation is an async fn the
//! host spawns on its runtime; the interactive context never blocks.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use keystash_catalog::{Catalog, WorkSet, incomplete_entries, incomplete_subset};
use tokio::sync::{Mutex, mpsc};

use crate::buffer::{self, UpdateBuffer};
use crate::client::Storefront;
use crate::worker::{self, FacetScope, RunState, SyncEvent};

/// The live catalog, shared with the host's UI layer.
pub type SharedCatalog = Arc<Mutex<Catalog>>;

/// Callbacks the host application provides. All of them may be invoked
/// from the worker's execution context.
pub trait SyncHost: Send + Sync {
    /// Progress text for a status label; empty string clears it.
    fn status_text(&self, text: &str);
    /// The is-fetching state flipped (e.g. toggle a fetch/cancel button).
    fn fetch_state_changed(&self, is_running: bool);
    /// The catalog changed; persist it.
    fn save_catalog(&self);
    /// The catalog changed; redraw whatever displays it.
    fn refresh_view(&self);
    /// A run ended; the report carries the terminal state and the titles
    /// that could not be resolved, for a dismissible summary.
    fn run_finished(&self, report: &SyncReport);
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub state: RunState,
    pub failed: BTreeSet<String>,
}

/// Result of a start operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every candidate entry was already complete; nothing was started.
    NothingToFetch,
    Finished(SyncReport),
}

/// How results land on the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApplyMode {
    /// Apply and save/refresh after every item (small explicit sets).
    Immediate,
    /// Stage everything, one atomic apply and one save/refresh per run.
    Batch,
}

pub struct SyncManager<S> {
    store: S,
    catalog: SharedCatalog,
    icons_dir: PathBuf,
    host: Arc<dyn SyncHost>,
    buffer: UpdateBuffer,
    cancel: AtomicBool,
    running: AtomicBool,
}

impl<S: Storefront> SyncManager<S> {
    pub fn new(
        store: S,
        catalog: SharedCatalog,
        icons_dir: impl Into<PathBuf>,
        host: Arc<dyn SyncHost>,
    ) -> Self {
        Self {
            store,
            catalog,
            icons_dir: icons_dir.into(),
            host,
            buffer: UpdateBuffer::new(),
            cancel: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Whether a run is active. At most one run may be active at a time;
    /// callers guard against concurrent starts with this flag (the engine
    /// does not reject a second start itself).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request cancellation of the active run. Cooperative: the worker
    /// honors it at the next item boundary, results already applied stay
    /// applied. No-op when nothing is running.
    pub fn cancel(&self) {
        if self.is_running() {
            self.cancel.store(true, Ordering::Relaxed);
            self.host.status_text("Canceling fetch operation...\nPlease wait.");
        }
    }

    /// Fetch every missing facet across the whole catalog. Batch apply:
    /// the catalog updates all at once when the run ends.
    pub async fn fetch_missing(&self) -> FetchOutcome {
        let work = {
            let catalog = self.catalog.lock().await;
            incomplete_entries(&catalog)
        };
        if work.is_empty() {
            self.host.status_text("");
            return FetchOutcome::NothingToFetch;
        }
        FetchOutcome::Finished(self.run(work, FacetScope::All, ApplyMode::Batch).await)
    }

    /// Fetch missing facets for an explicit id set (newly imported or
    /// edited entries). Applies and refreshes after each item, so small
    /// sets show up as they resolve. Already-complete entries are skipped.
    pub async fn fetch_for(&self, ids: &[String]) -> FetchOutcome {
        let work = {
            let catalog = self.catalog.lock().await;
            incomplete_subset(&catalog, ids)
        };
        if work.is_empty() {
            return FetchOutcome::NothingToFetch;
        }
        FetchOutcome::Finished(self.run(work, FacetScope::All, ApplyMode::Immediate).await)
    }

    /// Re-fetch review summaries for the whole catalog. Reviews are
    /// id-scoped, so every entry still goes through the resolver first.
    pub async fn refresh_reviews_only(&self) -> FetchOutcome {
        let work: WorkSet = {
            let catalog = self.catalog.lock().await;
            catalog
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect()
        };
        if work.is_empty() {
            return FetchOutcome::NothingToFetch;
        }
        FetchOutcome::Finished(
            self.run(work, FacetScope::ReviewsOnly, ApplyMode::Batch).await,
        )
    }

    async fn run(&self, work: WorkSet, scope: FacetScope, mode: ApplyMode) -> SyncReport {
        self.cancel.store(false, Ordering::Relaxed);
        self.running.store(true, Ordering::Relaxed);
        self.buffer.clear().await;
        self.host.fetch_state_changed(true);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker_task =
            worker::run_worker(&self.store, work, &self.icons_dir, scope, &self.cancel, tx);
        let consumer = async {
            // Ends when the worker drops its sender.
            while let Some(event) = rx.recv().await {
                self.handle_event(event, mode).await;
            }
        };
        let (worker_report, ()) = tokio::join!(worker_task, consumer);

        if mode == ApplyMode::Batch {
            let applied = {
                let mut catalog = self.catalog.lock().await;
                self.buffer.apply_all(&mut catalog).await
            };
            if applied > 0 {
                self.host.save_catalog();
                self.host.refresh_view();
            }
        }

        let report = SyncReport {
            state: worker_report.state,
            failed: worker_report.failed,
        };
        self.host.status_text("");
        self.running.store(false, Ordering::Relaxed);
        self.host.fetch_state_changed(false);
        self.host.run_finished(&report);
        report
    }

    async fn handle_event(&self, event: SyncEvent, mode: ApplyMode) {
        match event {
            SyncEvent::Started { total } => {
                log::debug!("sync run started: {total} entries");
            }
            SyncEvent::EntryStarted { index, total, title } => {
                self.host
                    .status_text(&format!("Fetching ({index}/{total}):\n{title}"));
            }
            SyncEvent::EntryFailed { title } => {
                log::debug!("could not resolve '{title}'");
            }
            SyncEvent::Cancelled => {
                self.host.status_text("Fetch operation canceled!");
            }
            SyncEvent::EntryResult { id, patch } => match mode {
                ApplyMode::Batch => self.buffer.record(&id, patch).await,
                ApplyMode::Immediate => {
                    let applied = {
                        let mut catalog = self.catalog.lock().await;
                        match catalog.get_mut(&id) {
                            Some(entry) => {
                                buffer::apply_patch(entry, &patch);
                                true
                            }
                            None => false,
                        }
                    };
                    if applied {
                        self.host.save_catalog();
                        self.host.refresh_view();
                    }
                }
            },
        }
    }
}
