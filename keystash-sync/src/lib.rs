//! Metadata synchronization engine for a redemption-key catalog.
//!
//! Given catalog entries that carry at minimum a title, the engine fills in
//! the facets a storefront can provide: an icon, an aggregate review
//! summary and a developer name. One background worker per run, cooperative
//! cancellation, and partial results by design: whatever was fetched before
//! a failure or a cancel stays fetched.

pub mod buffer;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod resolve;
pub mod review_page;
pub mod types;
pub mod worker;

#[cfg(test)]
mod testing;

pub use buffer::{PendingUpdate, UpdateBuffer, apply_patch};
pub use client::{SteamStoreClient, Storefront};
pub use coordinator::{FetchOutcome, SharedCatalog, SyncHost, SyncManager, SyncReport};
pub use error::SyncError;
pub use worker::{FacetScope, RunState, SyncEvent};
