/// Errors that can occur while talking to the storefront.
///
/// Nothing here is fatal to a sync run: facet code catches these and
/// degrades the facet to "absent"; the resolver maps them to a per-item
/// resolution failure.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected markup not found: {0}")]
    MissingMarkup(&'static str),
}
