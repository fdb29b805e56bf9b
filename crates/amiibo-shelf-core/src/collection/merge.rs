use crate::models::{CatalogItem, CollectionItem, StatusMap};

/// Join every catalog item with its status, defaulting missing statuses.
///
/// Statuses for identifiers absent from the catalog are left out of the
/// result but are not removed from `statuses`.
pub fn merge_status(catalog: &[CatalogItem], statuses: &StatusMap) -> Vec<CollectionItem> {
    catalog
        .iter()
        .map(|item| CollectionItem {
            item: item.clone(),
            status: statuses.get(&item.identifier).copied().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;
    use crate::testing::item;

    #[test]
    fn test_missing_status_defaults() {
        let catalog = vec![item("1", "a", "Mario"), item("2", "b", "Luigi")];
        let mut statuses = StatusMap::new();
        statuses.insert("1a".to_string(), ItemStatus::owned());

        let merged = merge_status(&catalog, &statuses);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].is_owned());
        assert!(!merged[0].is_favorite());
        assert!(merged[1].status.is_default());
    }

    #[test]
    fn test_orphans_are_dropped_from_view_only() {
        let catalog = vec![item("1", "a", "Mario")];
        let mut statuses = StatusMap::new();
        statuses.insert("9z".to_string(), ItemStatus::owned());

        let merged = merge_status(&catalog, &statuses);
        assert_eq!(merged.len(), 1);
        assert!(!merged[0].is_owned());
        assert!(statuses.contains_key("9z"));
    }

    #[test]
    fn test_merge_is_pure() {
        let catalog = vec![item("1", "a", "Mario"), item("2", "b", "Luigi")];
        let mut statuses = StatusMap::new();
        statuses.insert(
            "2b".to_string(),
            ItemStatus {
                owned: false,
                favorite: true,
            },
        );
        let catalog_before = catalog.clone();
        let statuses_before = statuses.clone();

        let first = merge_status(&catalog, &statuses);
        let second = merge_status(&catalog, &statuses);

        assert_eq!(first, second);
        assert_eq!(catalog, catalog_before);
        assert_eq!(statuses, statuses_before);
    }

    #[test]
    fn test_duplicate_identifiers_share_status() {
        let catalog = vec![item("1", "a", "Mario"), item("1", "a", "Mario (reissue)")];
        let mut statuses = StatusMap::new();
        statuses.insert("1a".to_string(), ItemStatus::owned());

        let merged = merge_status(&catalog, &statuses);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| m.is_owned()));
    }
}
