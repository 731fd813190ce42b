//! Identifier resolution: confirm a stored app id, or fall back to a fuzzy
//! title search.

use keystash_catalog::CatalogEntry;

use crate::client::Storefront;
use crate::types::SearchHit;

/// Minimum normalized similarity for an approximate title match.
const SIMILARITY_CUTOFF: f64 = 0.7;

/// A confirmed identifier for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub app_id: String,
    /// Set when the entry's previously confirmed id differs from this one
    /// and a cached review summary exists. Review data is id-scoped, so the
    /// stale summary must be cleared and the facet re-fetched.
    pub invalidate_review: bool,
}

/// Resolve an entry to a valid app id.
///
/// A stored id is confirmed via the details lookup first; a blank or
/// unconfirmed id falls back to the title search. `None` is a resolution
/// failure: the caller routes the entry's title into the failure list.
/// Transport errors are never propagated, only logged.
pub async fn resolve_entry<S: Storefront>(store: &S, entry: &CatalogEntry) -> Option<Resolution> {
    let stored = entry
        .catalog_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    if let Some(id) = stored {
        match store.app_details(id).await {
            Ok(Some(_)) => {
                let invalidate_review = entry
                    .last_resolved_id
                    .as_deref()
                    .is_some_and(|prev| prev != id)
                    && entry.review_summary.is_some();
                return Some(Resolution {
                    app_id: id.to_string(),
                    invalidate_review,
                });
            }
            Ok(None) => {
                log::debug!("app id {id} not confirmed for '{}', searching by title", entry.title);
            }
            Err(e) => {
                log::debug!("details lookup for {id} failed ({e}), searching by title");
            }
        }
    }

    search_by_title(store, &entry.title).await
}

async fn search_by_title<S: Storefront>(store: &S, title: &str) -> Option<Resolution> {
    let hits = match store.search(title).await {
        Ok(hits) => hits,
        Err(e) => {
            log::debug!("title search for '{title}' failed: {e}");
            return None;
        }
    };

    select_search_hit(title, &hits).map(|hit| Resolution {
        app_id: hit.id.to_string(),
        invalidate_review: false,
    })
}

/// Pick the best hit for a title: exact case-insensitive match, then the
/// closest approximate match clearing the cutoff, then the first result.
/// Zero results means resolution failure.
fn select_search_hit<'a>(title: &str, hits: &'a [SearchHit]) -> Option<&'a SearchHit> {
    if hits.is_empty() {
        return None;
    }

    let wanted = title.trim().to_lowercase();
    if let Some(exact) = hits.iter().find(|h| h.name.trim().to_lowercase() == wanted) {
        return Some(exact);
    }

    let mut best: Option<(f64, &SearchHit)> = None;
    for hit in hits {
        let score = strsim::normalized_levenshtein(&hit.name, title);
        if score >= SIMILARITY_CUTOFF && best.is_none_or(|(b, _)| score > b) {
            best = Some((score, hit));
        }
    }

    best.map(|(_, hit)| hit).or_else(|| hits.first())
}
