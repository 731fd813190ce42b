//! Facet extraction: icon, review summary, developer.
//!
//! Each facet is independent and tolerant of failure. Transport errors,
//! HTTP errors and missing markup all degrade the facet to `None`; they
//! never abort the item, let alone the run.

use std::path::{Path, PathBuf};

use keystash_catalog::ReviewSummary;

use crate::client::Storefront;
use crate::review_page;

/// Terminal rating for pages that stay gated after the bypass attempt.
/// Not retried within a run; the host can surface it as-is.
pub const AGE_RESTRICTED_TEXT: &str = "Age Restricted (Unable to Bypass)";

/// Fetch the header image and persist it into the icon cache as
/// `<app_id>.<ext>`. Returns the written path, or `None` on any failure.
pub async fn fetch_icon<S: Storefront>(
    store: &S,
    app_id: &str,
    icons_dir: &Path,
) -> Option<PathBuf> {
    let details = match store.app_details(app_id).await {
        Ok(Some(details)) => details,
        Ok(None) => return None,
        Err(e) => {
            log::debug!("icon facet: details lookup failed for {app_id}: {e}");
            return None;
        }
    };
    let url = details.header_image?;

    let bytes = match store.download_image(&url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("icon facet: download failed for {app_id}: {e}");
            return None;
        }
    };

    let dest = icons_dir.join(format!("{app_id}.{}", icon_extension(&url)));
    if let Err(e) = std::fs::write(&dest, &bytes) {
        log::warn!("icon facet: failed to write {}: {e}", dest.display());
        return None;
    }
    Some(dest)
}

/// Fetch the aggregate review summary: structured API first, store-page
/// scrape as fallback, with a one-shot age-gate bypass in between.
pub async fn fetch_review_summary<S: Storefront>(store: &S, app_id: &str) -> Option<ReviewSummary> {
    match store.review_summary(app_id).await {
        Ok(Some(summary)) => {
            if let Some(rating_text) = summary.review_score_desc.filter(|d| !d.is_empty()) {
                return Some(ReviewSummary {
                    rating_text,
                    review_count: summary.total_reviews,
                    age_restricted: false,
                });
            }
        }
        Ok(None) => {}
        Err(e) => log::debug!("review facet: summary API failed for {app_id}: {e}"),
    }

    let mut page = match store.store_page(app_id).await {
        Ok(page) => page,
        Err(e) => {
            log::debug!("review facet: store page fetch failed for {app_id}: {e}");
            return None;
        }
    };

    if review_page::is_age_gated(&page) {
        page = match store.store_page_bypassing_age_gate(app_id).await {
            Ok(page) => page,
            Err(e) => {
                log::debug!("review facet: age-gate bypass failed for {app_id}: {e}");
                return None;
            }
        };
        if review_page::is_age_gated(&page) {
            return Some(ReviewSummary {
                rating_text: AGE_RESTRICTED_TEXT.to_string(),
                review_count: None,
                age_restricted: true,
            });
        }
    }

    match review_page::parse_review_summary(&page) {
        Ok(summary) => Some(summary),
        Err(e) => {
            log::debug!("review facet: no summary on page for {app_id}: {e}");
            None
        }
    }
}

/// Fetch the developer name: details API list joined with ", ", else the
/// labeled row on the store page.
pub async fn fetch_developer<S: Storefront>(store: &S, app_id: &str) -> Option<String> {
    match store.app_details(app_id).await {
        Ok(Some(details)) if !details.developers.is_empty() => {
            return Some(details.developers.join(", "));
        }
        Ok(_) => {}
        Err(e) => log::debug!("developer facet: details lookup failed for {app_id}: {e}"),
    }

    match store.store_page(app_id).await {
        Ok(page) => review_page::parse_developer_row(&page),
        Err(e) => {
            log::debug!("developer facet: store page fetch failed for {app_id}: {e}");
            None
        }
    }
}

/// File extension for the icon cache, taken from the image URL. Query
/// strings and odd CDN paths fall back to jpg.
fn icon_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => "jpg",
    }
}
