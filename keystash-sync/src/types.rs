//! Wire types for the storefront's JSON endpoints.

use std::collections::HashMap;

use serde::Deserialize;

/// Response from the details-by-id endpoint: an object keyed by the
/// requested app id.
pub type AppDetailsEnvelope = HashMap<String, AppDetailsEntry>;

#[derive(Debug, Deserialize)]
pub struct AppDetailsEntry {
    pub success: bool,
    #[serde(default)]
    pub data: Option<AppDetails>,
}

/// The slice of the details payload this engine cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppDetails {
    #[serde(default)]
    pub header_image: Option<String>,
    #[serde(default)]
    pub developers: Vec<String>,
}

/// Response from the fuzzy search-by-term endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StoreSearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub name: String,
}

/// Response from the structured reviews-summary endpoint.
#[derive(Debug, Deserialize)]
pub struct ReviewsApiResponse {
    /// 1 on success; anything else means fall back to scraping.
    #[serde(default)]
    pub success: u8,
    #[serde(default)]
    pub query_summary: Option<ReviewQuerySummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewQuerySummary {
    #[serde(default)]
    pub total_reviews: Option<u64>,
    #[serde(default)]
    pub review_score_desc: Option<String>,
}
