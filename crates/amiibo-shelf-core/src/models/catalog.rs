//! Catalog records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::release::ReleaseDates;

/// Top-level catalog response: `{"amiibo": [...]}`.
#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    pub amiibo: Vec<CatalogRecord>,
}

/// A catalog record as the API sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub head: String,
    pub tail: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub game_series: String,
    #[serde(default)]
    pub amiibo_series: String,
    #[serde(default, rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub release: Option<HashMap<String, Option<String>>>,
}

impl CatalogRecord {
    pub fn to_item(&self) -> CatalogItem {
        CatalogItem {
            identifier: CatalogItem::identifier_for(&self.head, &self.tail),
            display_name: self.name.clone(),
            image_url: self.image.clone(),
            character: self.character.clone(),
            game_series: self.game_series.clone(),
            amiibo_series: self.amiibo_series.clone(),
            item_type: self.item_type.clone(),
            release: self
                .release
                .clone()
                .map(ReleaseDates::from_raw)
                .unwrap_or_default(),
        }
    }
}

/// An immutable catalog entry.
///
/// Identifiers are assumed unique but the API does not guarantee it.
/// Any map keyed by identifier keeps the last entry it sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub identifier: String,
    pub display_name: String,
    pub image_url: String,
    pub character: String,
    pub game_series: String,
    pub amiibo_series: String,
    pub item_type: String,
    #[serde(default)]
    pub release: ReleaseDates,
}

impl CatalogItem {
    /// The identifier is the plain concatenation of the two opaque halves.
    pub fn identifier_for(head: &str, tail: &str) -> String {
        format!("{}{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;

    #[test]
    fn test_parse_catalog_response() {
        let json = r#"{"amiibo": [{"amiiboSeries": "Super Smash Bros.", "character": "Mario", "gameSeries": "Super Mario", "head": "00000000", "image": "https://example.test/mario.png", "name": "Mario", "release": {"au": "2014-11-29", "eu": "2014-11-28", "jp": "2014-12-06", "na": "2014-11-21"}, "tail": "00340102", "type": "Figure"}]}"#;

        let resp: CatalogResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.amiibo.len(), 1);

        let item = resp.amiibo[0].to_item();
        assert_eq!(item.identifier, "0000000000340102");
        assert_eq!(item.display_name, "Mario");
        assert_eq!(item.item_type, "Figure");
        assert_eq!(item.game_series, "Super Mario");
        assert_eq!(item.release.date(Region::Na), Some("2014-11-21"));
    }

    #[test]
    fn test_record_without_optional_fields() {
        let json = r#"{"head": "1", "tail": "a"}"#;
        let record: CatalogRecord = serde_json::from_str(json).unwrap();
        let item = record.to_item();
        assert_eq!(item.identifier, "1a");
        assert!(item.release.is_empty());
        assert_eq!(item.display_name, "");
    }

    #[test]
    fn test_record_missing_head_is_rejected() {
        let json = r#"{"tail": "a", "name": "Nameless"}"#;
        assert!(serde_json::from_str::<CatalogRecord>(json).is_err());
    }
}
