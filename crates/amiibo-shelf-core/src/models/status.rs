//! User collection state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::catalog::CatalogItem;

/// Ownership and favorite flags for one identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub owned: bool,
    #[serde(default)]
    pub favorite: bool,
}

impl ItemStatus {
    pub fn owned() -> Self {
        Self {
            owned: true,
            favorite: false,
        }
    }

    /// True when neither flag is set.
    pub fn is_default(&self) -> bool {
        !self.owned && !self.favorite
    }
}

/// Status per identifier. Entries for identifiers missing from the current
/// catalog are kept; a later catalog may bring them back.
pub type StatusMap = HashMap<String, ItemStatus>;

/// A catalog item joined with its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionItem {
    pub item: CatalogItem,
    pub status: ItemStatus,
}

impl CollectionItem {
    pub fn identifier(&self) -> &str {
        &self.item.identifier
    }

    pub fn is_owned(&self) -> bool {
        self.status.owned
    }

    pub fn is_favorite(&self) -> bool {
        self.status.favorite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_missing_fields_default() {
        let status: ItemStatus = serde_json::from_str(r#"{"owned": true}"#).unwrap();
        assert_eq!(status, ItemStatus::owned());

        let status: ItemStatus = serde_json::from_str("{}").unwrap();
        assert!(status.is_default());
    }
}
