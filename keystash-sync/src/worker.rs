//! The per-run background worker.
//!
//! One worker iterates one work set: resolve, extract, emit. All blocking
//! I/O in the engine happens here; the coordinator and the host UI stay on
//! their own execution context and consume the event stream.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use keystash_catalog::{CatalogEntry, WorkSet};
use tokio::sync::mpsc;

use crate::buffer::PendingUpdate;
use crate::client::Storefront;
use crate::extract;
use crate::resolve::{self, Resolution};

/// Which facets a run fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetScope {
    /// Every facet the entry is missing.
    All,
    /// Review summary only, refreshed even when already present.
    ReviewsOnly,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Completed,
    Cancelled,
}

/// Events emitted while a run is in flight, in emission order.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Started { total: usize },
    EntryStarted { index: usize, total: usize, title: String },
    /// A resolved entry's patch, ready for the update buffer.
    EntryResult { id: String, patch: PendingUpdate },
    /// Resolution failed; the title joins the failure list.
    EntryFailed { title: String },
    Cancelled,
}

/// What the worker hands back when the run ends.
#[derive(Debug)]
pub struct WorkerReport {
    pub state: RunState,
    /// Titles that could not be resolved. A set: each title at most once.
    pub failed: BTreeSet<String>,
}

/// Process a work set to completion or cancellation.
///
/// The cancellation flag is cooperative and checked once per item
/// boundary; an in-flight request finishes before the flag is honored.
/// Results already emitted stay emitted.
pub async fn run_worker<S: Storefront>(
    store: &S,
    work: WorkSet,
    icons_dir: &Path,
    scope: FacetScope,
    cancel: &AtomicBool,
    events: mpsc::UnboundedSender<SyncEvent>,
) -> WorkerReport {
    if let Err(e) = std::fs::create_dir_all(icons_dir) {
        log::warn!("could not create icon cache {}: {e}", icons_dir.display());
    }

    let total = work.len();
    let _ = events.send(SyncEvent::Started { total });

    let mut failed = BTreeSet::new();
    let mut state = RunState::Completed;

    for (index, (id, entry)) in work.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            state = RunState::Cancelled;
            let _ = events.send(SyncEvent::Cancelled);
            break;
        }

        let _ = events.send(SyncEvent::EntryStarted {
            index: index + 1,
            total,
            title: entry.title.clone(),
        });

        let Some(resolution) = resolve::resolve_entry(store, entry).await else {
            failed.insert(entry.title.clone());
            let _ = events.send(SyncEvent::EntryFailed {
                title: entry.title.clone(),
            });
            continue;
        };

        let patch = fetch_missing_facets(store, entry, &resolution, icons_dir, scope).await;
        let _ = events.send(SyncEvent::EntryResult {
            id: id.clone(),
            patch,
        });
    }

    WorkerReport { state, failed }
}

/// Build the patch for one resolved entry, fetching only the facets it is
/// missing. A facet that fails stays absent in the patch, which the apply
/// step treats as "keep whatever is there".
async fn fetch_missing_facets<S: Storefront>(
    store: &S,
    entry: &CatalogEntry,
    resolution: &Resolution,
    icons_dir: &Path,
    scope: FacetScope,
) -> PendingUpdate {
    let app_id = &resolution.app_id;
    let mut patch = PendingUpdate::new(app_id.clone());
    patch.invalidate_review = resolution.invalidate_review;

    if scope == FacetScope::ReviewsOnly {
        patch.review_summary = extract::fetch_review_summary(store, app_id).await;
        return patch;
    }

    let icon_missing = entry.icon_path.as_ref().is_none_or(|p| !p.exists());
    let review_missing = entry.review_summary.is_none() || resolution.invalidate_review;
    let developer_missing = entry.developer.as_deref().is_none_or(|d| d.trim().is_empty());

    if icon_missing {
        patch.icon_path = extract::fetch_icon(store, app_id, icons_dir).await;
    }
    if review_missing {
        patch.review_summary = extract::fetch_review_summary(store, app_id).await;
    }
    if developer_missing {
        patch.developer = extract::fetch_developer(store, app_id).await;
    }
    patch
}
