//! Per-item detail records (release dates and compatible games).
//!
//! Details are looked up by display name, not by identifier. Two catalog
//! items sharing a display name resolve to the same detail record.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

use super::release::ReleaseDates;

/// Detail response: `{"amiibo": [...]}` with zero or one useful record.
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub amiibo: Vec<DetailRecord>,
}

/// Treats a present `null` like a present empty list, and leaves a missing
/// key as `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub release: Option<HashMap<String, Option<String>>>,
    #[serde(default, rename = "games3DS", deserialize_with = "present")]
    pub games_3ds: Option<Vec<GameUsageRecord>>,
    #[serde(default, rename = "gamesSwitch", deserialize_with = "present")]
    pub games_switch: Option<Vec<GameUsageRecord>>,
    #[serde(default, rename = "gamesWiiU", deserialize_with = "present")]
    pub games_wiiu: Option<Vec<GameUsageRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUsageRecord {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub amiibo_usage: Option<Vec<UsageRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageRecord {
    #[serde(default, rename = "Usage")]
    pub usage: String,
    #[serde(default)]
    pub write: bool,
}

impl DetailRecord {
    pub fn to_detail(&self) -> ItemDetail {
        let mut games = BTreeMap::new();
        let platforms = [
            (Platform::N3ds, &self.games_3ds),
            (Platform::Switch, &self.games_switch),
            (Platform::WiiU, &self.games_wiiu),
        ];
        for (platform, list) in platforms {
            if let Some(list) = list {
                games.insert(platform, list.iter().map(GameUsage::from_record).collect());
            }
        }

        ItemDetail {
            name: self.name.clone(),
            release: self
                .release
                .clone()
                .map(ReleaseDates::from_raw)
                .unwrap_or_default(),
            games,
        }
    }
}

/// Platforms the detail endpoint reports game compatibility for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "3ds")]
    N3ds,
    #[serde(rename = "switch")]
    Switch,
    #[serde(rename = "wiiu")]
    WiiU,
}

impl Platform {
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::N3ds => "Nintendo 3DS",
            Platform::Switch => "Nintendo Switch",
            Platform::WiiU => "Wii U",
        }
    }
}

/// A game that supports the item, with what the item does in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameUsage {
    pub game_name: String,
    pub usage_notes: Vec<String>,
    /// True when any listed usage writes data to the figure.
    #[serde(default)]
    pub writes_data: bool,
}

impl GameUsage {
    fn from_record(record: &GameUsageRecord) -> Self {
        let usage = record.amiibo_usage.as_deref().unwrap_or_default();
        Self {
            game_name: record.game_name.clone(),
            usage_notes: usage
                .iter()
                .map(|u| u.usage.clone())
                .filter(|u| !u.is_empty())
                .collect(),
            writes_data: usage.iter().any(|u| u.write),
        }
    }
}

/// Detail snapshot for one display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub name: String,
    #[serde(default)]
    pub release: ReleaseDates,
    /// Compatible games per platform. A platform missing from the map was not
    /// reported; a platform mapped to an empty list was reported with none.
    #[serde(default)]
    pub games: BTreeMap<Platform, Vec<GameUsage>>,
}

impl ItemDetail {
    pub fn games_for(&self, platform: Platform) -> Option<&[GameUsage]> {
        self.games.get(&platform).map(|g| g.as_slice())
    }

    pub fn total_games(&self) -> usize {
        self.games.values().map(|g| g.len()).sum()
    }
}
