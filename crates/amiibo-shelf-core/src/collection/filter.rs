//! Filtering and summary helpers over a merged collection.

use std::collections::BTreeSet;

use crate::models::CollectionItem;
use crate::utils::contains_ignore_case;

/// Criteria for narrowing a collection. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// Matches display name or character, case-insensitive
    pub search: Option<String>,
    /// `Some(true)` for owned only, `Some(false)` for not owned only
    pub owned: Option<bool>,
    pub favorites_only: bool,
    pub game_series: Option<String>,
    pub item_type: Option<String>,
}

impl Filter {
    pub fn matches(&self, entry: &CollectionItem) -> bool {
        let item = &entry.item;

        let matches_search = match self.search.as_deref() {
            None | Some("") => true,
            Some(term) => {
                contains_ignore_case(&item.display_name, term)
                    || contains_ignore_case(&item.character, term)
            }
        };
        let matches_owned = self.owned.map_or(true, |owned| entry.status.owned == owned);
        let matches_favorite = !self.favorites_only || entry.status.favorite;
        let matches_series = self
            .game_series
            .as_deref()
            .map_or(true, |s| s.is_empty() || item.game_series == s);
        let matches_type = self
            .item_type
            .as_deref()
            .map_or(true, |t| t.is_empty() || item.item_type == t);

        matches_search && matches_owned && matches_favorite && matches_series && matches_type
    }

    pub fn apply<'a>(&self, items: &'a [CollectionItem]) -> Vec<&'a CollectionItem> {
        items.iter().filter(|entry| self.matches(entry)).collect()
    }
}

/// Sorted distinct game series.
pub fn unique_game_series(items: &[CollectionItem]) -> Vec<&str> {
    let series: BTreeSet<&str> = items.iter().map(|e| e.item.game_series.as_str()).collect();
    series.into_iter().collect()
}

/// Sorted distinct item types.
pub fn unique_types(items: &[CollectionItem]) -> Vec<&str> {
    let types: BTreeSet<&str> = items.iter().map(|e| e.item.item_type.as_str()).collect();
    types.into_iter().collect()
}

/// Collection counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub owned: usize,
    pub favorites: usize,
}

impl Stats {
    pub fn of(items: &[CollectionItem]) -> Self {
        Self {
            total: items.len(),
            owned: items.iter().filter(|e| e.status.owned).count(),
            favorites: items.iter().filter(|e| e.status.favorite).count(),
        }
    }
}
