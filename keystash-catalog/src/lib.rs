pub mod entry;
pub mod workset;

pub use entry::{Catalog, CatalogEntry, ReviewSummary};
pub use workset::{WorkSet, incomplete_entries, incomplete_subset};
