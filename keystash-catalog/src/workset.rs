//! Work set selection for sync runs.
//!
//! A work set is the subset of catalog entries a single run will process,
//! cloned out of the live catalog so the worker never holds the catalog
//! lock across network calls. Both selection modes go through the same
//! completeness predicate: entries that already have every facet are never
//! reprocessed.

use indexmap::IndexMap;

use crate::entry::{Catalog, CatalogEntry};

/// Ordered mapping from unique id to a snapshot of the entry to process.
pub type WorkSet = IndexMap<String, CatalogEntry>;

/// Select every incomplete entry in the catalog (the default bulk fetch).
pub fn incomplete_entries(catalog: &Catalog) -> WorkSet {
    catalog
        .iter()
        .filter(|(_, entry)| !entry.is_complete())
        .map(|(id, entry)| (id.clone(), entry.clone()))
        .collect()
}

/// Select incomplete entries among an explicit id set (import/edit paths).
///
/// Ids that are not in the catalog are ignored. Order follows the given ids.
pub fn incomplete_subset(catalog: &Catalog, ids: &[String]) -> WorkSet {
    ids.iter()
        .filter_map(|id| catalog.get(id).map(|entry| (id.clone(), entry.clone())))
        .filter(|(_, entry)| !entry.is_complete())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ReviewSummary;

    fn complete_entry(dir: &std::path::Path, title: &str, id: &str) -> CatalogEntry {
        let icon = dir.join(format!("{id}.jpg"));
        std::fs::write(&icon, b"jpeg").unwrap();
        CatalogEntry {
            title: title.to_string(),
            catalog_id: Some(id.to_string()),
            icon_path: Some(icon),
            review_summary: Some(ReviewSummary::default()),
            developer: Some("Valve".to_string()),
            last_resolved_id: Some(id.to_string()),
        }
    }

    #[test]
    fn complete_catalog_yields_empty_work_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::new();
        catalog.insert("a".into(), complete_entry(dir.path(), "Half-Life", "70"));
        catalog.insert("b".into(), complete_entry(dir.path(), "Portal", "400"));
        assert!(incomplete_entries(&catalog).is_empty());
    }

    #[test]
    fn incomplete_entries_are_selected_in_catalog_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::new();
        catalog.insert("a".into(), CatalogEntry::new("Half-Life"));
        catalog.insert("b".into(), complete_entry(dir.path(), "Portal", "400"));
        catalog.insert("c".into(), CatalogEntry::new("Dota 2"));

        let work = incomplete_entries(&catalog);
        let ids: Vec<&String> = work.keys().collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn subset_filters_through_the_same_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::new();
        catalog.insert("a".into(), complete_entry(dir.path(), "Portal", "400"));
        catalog.insert("b".into(), CatalogEntry::new("Dota 2"));

        let work = incomplete_subset(&catalog, &["a".into(), "b".into(), "ghost".into()]);
        assert_eq!(work.len(), 1);
        assert!(work.contains_key("b"));
    }
}
