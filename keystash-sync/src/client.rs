//! HTTP client for the Steam storefront endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::USER_AGENT;

use crate::error::SyncError;
use crate::types::{
    AppDetails, AppDetailsEnvelope, ReviewQuerySummary, ReviewsApiResponse, SearchHit,
    StoreSearchResponse,
};

const STORE_BASE: &str = "https://store.steampowered.com";

/// Fixed timeout for every storefront request. No retries, no backoff;
/// a timed-out facet is simply absent until the next run.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The store serves an age-gate interstitial to clients it doesn't
/// recognize as browsers, so HTML fetches carry a browser user-agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// The storefront operations the engine needs. The worker and the tests
/// depend on this seam rather than on the concrete HTTP client.
#[allow(async_fn_in_trait)]
pub trait Storefront {
    /// Details lookup by app id. `Ok(None)` means the store answered but
    /// did not confirm the id (`success: false`).
    async fn app_details(&self, app_id: &str) -> Result<Option<AppDetails>, SyncError>;

    /// Fuzzy title search.
    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, SyncError>;

    /// Structured reviews-summary API. `Ok(None)` means the API declined;
    /// callers fall back to scraping the store page.
    async fn review_summary(&self, app_id: &str) -> Result<Option<ReviewQuerySummary>, SyncError>;

    /// Raw HTML of the product's store page.
    async fn store_page(&self, app_id: &str) -> Result<String, SyncError>;

    /// Re-fetch the store page through a session that has already "passed"
    /// the age check. One-shot: callers decide what a still-gated page means.
    async fn store_page_bypassing_age_gate(&self, app_id: &str) -> Result<String, SyncError>;

    /// Download an image by URL (icon thumbnails).
    async fn download_image(&self, url: &str) -> Result<Vec<u8>, SyncError>;
}

/// `Storefront` implementation over the public Steam store endpoints.
pub struct SteamStoreClient {
    http: reqwest::Client,
}

impl SteamStoreClient {
    pub fn new() -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

impl Storefront for SteamStoreClient {
    async fn app_details(&self, app_id: &str) -> Result<Option<AppDetails>, SyncError> {
        let resp = self
            .http
            .get(format!("{STORE_BASE}/api/appdetails"))
            .query(&[("appids", app_id)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let mut envelope: AppDetailsEnvelope = resp.json().await?;
        Ok(envelope.remove(app_id).and_then(|entry| {
            if entry.success {
                Some(entry.data.unwrap_or_default())
            } else {
                None
            }
        }))
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchHit>, SyncError> {
        let resp = self
            .http
            .get(format!("{STORE_BASE}/api/storesearch/"))
            .query(&[("term", term), ("l", "english"), ("cc", "US")])
            .send()
            .await?
            .error_for_status()?;
        let results: StoreSearchResponse = resp.json().await?;
        Ok(results.items)
    }

    async fn review_summary(&self, app_id: &str) -> Result<Option<ReviewQuerySummary>, SyncError> {
        let resp = self
            .http
            .get(format!("{STORE_BASE}/appreviews/{app_id}"))
            .query(&[
                ("json", "1"),
                ("purchase_type", "all"),
                ("language", "all"),
                ("review_type", "all"),
                ("filter_by", "summary"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let api: ReviewsApiResponse = resp.json().await?;
        if api.success == 1 {
            Ok(api.query_summary)
        } else {
            Ok(None)
        }
    }

    async fn store_page(&self, app_id: &str) -> Result<String, SyncError> {
        let resp = self
            .http
            .get(format!("{STORE_BASE}/app/{app_id}/"))
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }

    async fn store_page_bypassing_age_gate(&self, app_id: &str) -> Result<String, SyncError> {
        // Fresh session carrying "already verified" cookies, plus the form
        // submission the age-check page would have posted.
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let base: reqwest::Url = STORE_BASE.parse().expect("static store base url is valid");
        jar.add_cookie_str("birthtime=-473392799; Path=/", &base);
        jar.add_cookie_str("mature_content=1; Path=/", &base);

        let session = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_provider(jar)
            .build()?;

        session
            .post(format!("{STORE_BASE}/agecheckset/app/{app_id}/"))
            .form(&[
                ("snr", "1_agecheck_agecheck__age-gate"),
                ("ageDay", "1"),
                ("ageMonth", "1"),
                ("ageYear", "1970"),
            ])
            .send()
            .await?;

        let resp = session
            .get(format!("{STORE_BASE}/app/{app_id}/"))
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }

    async fn download_image(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}
