//! Data model types for the key catalog.
//!
//! These types represent what the host application persists: one entry per
//! redemption key, plus the storefront metadata the sync engine fills in.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The live catalog: host-assigned unique id -> entry, insertion-ordered.
pub type Catalog = IndexMap<String, CatalogEntry>;

/// One inventory item as known to the sync engine.
///
/// Identity is the opaque unique id the host keys the catalog by; the engine
/// never assigns ids. The four metadata facets (`catalog_id`, `icon_path`,
/// `review_summary`, `developer`) start out absent and are filled in by
/// sync runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    /// The storefront's numeric app id, as a string. User-editable.
    #[serde(default)]
    pub catalog_id: Option<String>,
    /// Path to the cached thumbnail image, if downloaded.
    #[serde(default)]
    pub icon_path: Option<PathBuf>,
    #[serde(default)]
    pub review_summary: Option<ReviewSummary>,
    #[serde(default)]
    pub developer: Option<String>,
    /// The app id the engine last confirmed against the storefront. Review
    /// data is id-scoped, so a mismatch with a freshly confirmed id means
    /// the cached summary belongs to a different product and must go.
    #[serde(default)]
    pub last_resolved_id: Option<String>,
}

impl CatalogEntry {
    /// Create a bare entry with only a title, as the host does on import.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Whether all four metadata facets are present.
    ///
    /// The icon counts only if the file still exists on disk; a stale path
    /// to a deleted cache file makes the entry incomplete again.
    pub fn is_complete(&self) -> bool {
        !is_blank(&self.catalog_id)
            && self.icon_path.as_ref().is_some_and(|p| p.exists())
            && self.review_summary.is_some()
            && !is_blank(&self.developer)
    }
}

/// Aggregate review data for one catalog identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Human-readable rating, e.g. "Very Positive".
    pub rating_text: String,
    /// Total review count, when the storefront exposed one. A summary with
    /// no count is still valid data.
    #[serde(default)]
    pub review_count: Option<u64>,
    /// Set when the product page is gated and the gate could not be
    /// bypassed; such a summary carries no rating worth re-fetching blindly.
    #[serde(default)]
    pub age_restricted: bool,
}

impl ReviewSummary {
    /// Display form for table cells: `"Very Positive (12,345)"`, or just the
    /// rating text when no count is known or the entry is age-restricted.
    pub fn display_label(&self) -> String {
        if self.age_restricted {
            return self.rating_text.clone();
        }
        match self.review_count {
            Some(count) => format!("{} ({})", self.rating_text, group_thousands(count)),
            None => self.rating_text.clone(),
        }
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
