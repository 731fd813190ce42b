//! Pending-update staging and patch application.
//!
//! The buffer is the one shared-mutation guard in the engine. In batch
//! mode the worker's results accumulate here and land on the catalog in a
//! single `apply_all`, so competing UI reads never observe a half-updated
//! batch. The mutex is held only for map writes or the bulk apply, never
//! across a network call.

use indexmap::IndexMap;
use keystash_catalog::{Catalog, CatalogEntry, ReviewSummary};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// A partial patch for one entry. Fields are populated only when newly
/// discovered; an absent field never overwrites existing good data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingUpdate {
    pub catalog_id: String,
    pub icon_path: Option<PathBuf>,
    pub review_summary: Option<ReviewSummary>,
    pub developer: Option<String>,
    /// Clear the entry's existing review summary before applying the rest
    /// of the patch. The one sanctioned "overwrite with nothing": review
    /// data is id-scoped and this patch confirmed a different id.
    pub invalidate_review: bool,
}

impl PendingUpdate {
    pub fn new(catalog_id: String) -> Self {
        Self {
            catalog_id,
            ..Self::default()
        }
    }
}

/// Copy a patch onto a live entry.
pub fn apply_patch(entry: &mut CatalogEntry, patch: &PendingUpdate) {
    entry.catalog_id = Some(patch.catalog_id.clone());
    entry.last_resolved_id = Some(patch.catalog_id.clone());
    if patch.invalidate_review {
        entry.review_summary = None;
    }
    if let Some(icon_path) = &patch.icon_path {
        entry.icon_path = Some(icon_path.clone());
    }
    if let Some(summary) = &patch.review_summary {
        entry.review_summary = Some(summary.clone());
    }
    if let Some(developer) = &patch.developer {
        entry.developer = Some(developer.clone());
    }
}

/// Mutex-guarded accumulator for batch-mode runs.
#[derive(Debug, Default)]
pub struct UpdateBuffer {
    pending: Mutex<IndexMap<String, PendingUpdate>>,
}

impl UpdateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop anything staged by a previous run.
    pub async fn clear(&self) {
        self.pending.lock().await.clear();
    }

    /// Stage (or replace) the pending patch for an entry.
    pub async fn record(&self, id: &str, patch: PendingUpdate) {
        self.pending.lock().await.insert(id.to_string(), patch);
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }

    /// Copy every staged patch onto the live catalog, then clear the
    /// buffer. Returns how many entries were patched; zero means the
    /// caller has nothing to save or refresh. Ids no longer in the catalog
    /// (entry deleted mid-run) are skipped.
    pub async fn apply_all(&self, catalog: &mut Catalog) -> usize {
        let mut pending = self.pending.lock().await;
        let mut applied = 0;
        for (id, patch) in pending.iter() {
            if let Some(entry) = catalog.get_mut(id) {
                apply_patch(entry, patch);
                applied += 1;
            }
        }
        pending.clear();
        applied
    }
}
