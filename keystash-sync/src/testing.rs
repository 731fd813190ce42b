//! In-memory doubles for the storefront seam and the host callbacks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::client::Storefront;
use crate::coordinator::{SyncHost, SyncReport};
use crate::error::SyncError;
use crate::types::{AppDetails, ReviewQuerySummary, SearchHit};

/// Rendezvous that holds a run open at a known point so a test can act
/// while an item is mid-flight.
pub(crate) struct PausePoint {
    pub app_id: String,
    /// Notified when the paused call is reached.
    pub reached: Arc<Notify>,
    /// The call resumes once this is notified.
    pub proceed: Arc<Notify>,
}

/// Scripted storefront. Lookups answer from the maps; an id missing from
/// `pages`/`bypassed_pages` surfaces as a transport-style error, an id
/// missing from `details`/`reviews` as a polite "not found".
#[derive(Default)]
pub(crate) struct FakeStore {
    pub details: HashMap<String, AppDetails>,
    pub search_hits: Vec<SearchHit>,
    pub reviews: HashMap<String, ReviewQuerySummary>,
    pub pages: HashMap<String, String>,
    pub bypassed_pages: HashMap<String, String>,
    pub image_bytes: Vec<u8>,
    pub pause_on_review: Option<PausePoint>,
}

fn unreachable_endpoint(what: &str) -> SyncError {
    SyncError::Io(std::io::Error::other(what.to_string()))
}

impl Storefront for FakeStore {
    async fn app_details(&self, app_id: &str) -> Result<Option<AppDetails>, SyncError> {
        Ok(self.details.get(app_id).cloned())
    }

    async fn search(&self, _term: &str) -> Result<Vec<SearchHit>, SyncError> {
        Ok(self.search_hits.clone())
    }

    async fn review_summary(&self, app_id: &str) -> Result<Option<ReviewQuerySummary>, SyncError> {
        if let Some(pause) = &self.pause_on_review {
            if pause.app_id == app_id {
                pause.reached.notify_one();
                pause.proceed.notified().await;
            }
        }
        Ok(self.reviews.get(app_id).cloned())
    }

    async fn store_page(&self, app_id: &str) -> Result<String, SyncError> {
        self.pages
            .get(app_id)
            .cloned()
            .ok_or_else(|| unreachable_endpoint("store page unavailable"))
    }

    async fn store_page_bypassing_age_gate(&self, app_id: &str) -> Result<String, SyncError> {
        self.bypassed_pages
            .get(app_id)
            .cloned()
            .ok_or_else(|| unreachable_endpoint("age-gated page unavailable"))
    }

    async fn download_image(&self, _url: &str) -> Result<Vec<u8>, SyncError> {
        Ok(self.image_bytes.clone())
    }
}

/// Host that records every callback for later assertions.
#[derive(Default)]
pub(crate) struct RecordingHost {
    statuses: Mutex<Vec<String>>,
    state_changes: Mutex<Vec<bool>>,
    saves: AtomicUsize,
    refreshes: AtomicUsize,
    reports: Mutex<Vec<SyncReport>>,
}

impl RecordingHost {
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn state_changes(&self) -> Vec<bool> {
        self.state_changes.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::Relaxed)
    }

    pub fn reports(&self) -> Vec<SyncReport> {
        self.reports.lock().unwrap().clone()
    }
}

impl SyncHost for RecordingHost {
    fn status_text(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_string());
    }

    fn fetch_state_changed(&self, is_running: bool) {
        self.state_changes.lock().unwrap().push(is_running);
    }

    fn save_catalog(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    fn refresh_view(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    fn run_finished(&self, report: &SyncReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}
