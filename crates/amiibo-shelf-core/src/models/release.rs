//! Per-region release dates.
//!
//! The API sends `release` as an object whose keys are region codes and
//! whose values are a date string or `null`. A region may also be missing
//! entirely. Both cases are kept apart here: a missing key is absent from
//! the map, a `null` value is stored as `None`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Release regions known to the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Au,
    Eu,
    Jp,
    Na,
}

impl Region {
    /// Parse an API region code. Returns None for codes we don't know.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "au" => Some(Region::Au),
            "eu" => Some(Region::Eu),
            "jp" => Some(Region::Jp),
            "na" => Some(Region::Na),
            _ => None,
        }
    }

    /// Get the display name for this region.
    pub fn display_name(&self) -> &'static str {
        match self {
            Region::Au => "Australia",
            Region::Eu => "Europe",
            Region::Jp => "Japan",
            Region::Na => "North America",
        }
    }
}

/// Release date per region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseDates(BTreeMap<Region, Option<String>>);

impl ReleaseDates {
    /// Build from the raw API object, dropping region codes we don't know.
    pub fn from_raw(raw: HashMap<String, Option<String>>) -> Self {
        let mut dates = BTreeMap::new();
        for (code, date) in raw {
            match Region::from_code(&code) {
                Some(region) => {
                    dates.insert(region, date);
                }
                None => debug!(region = %code, "Ignoring unknown release region"),
            }
        }
        Self(dates)
    }

    /// The date for a region, if the region was sent with a value.
    pub fn date(&self, region: Region) -> Option<&str> {
        self.0.get(&region).and_then(|d| d.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, Option<&str>)> {
        self.0.iter().map(|(r, d)| (*r, d.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_keeps_null_and_absent_apart() {
        let raw: HashMap<String, Option<String>> =
            serde_json::from_str(r#"{"na": "2014-11-21", "jp": null, "xx": "2020-01-01"}"#)
                .unwrap();
        let dates = ReleaseDates::from_raw(raw);

        assert_eq!(dates.date(Region::Na), Some("2014-11-21"));
        assert!(dates.iter().any(|(r, _)| r == Region::Jp));
        assert_eq!(dates.date(Region::Jp), None);
        assert!(!dates.iter().any(|(r, _)| r == Region::Eu));
        assert_eq!(dates.iter().count(), 2);
    }

    #[test]
    fn test_serialized_form_survives_cache() {
        let raw: HashMap<String, Option<String>> =
            serde_json::from_str(r#"{"au": null, "eu": "2014-11-28"}"#).unwrap();
        let dates = ReleaseDates::from_raw(raw);

        let json = serde_json::to_string(&dates).unwrap();
        let back: ReleaseDates = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dates);
        assert!(back.iter().any(|(r, _)| r == Region::Au));
        assert!(!back.iter().any(|(r, _)| r == Region::Na));
    }
}
