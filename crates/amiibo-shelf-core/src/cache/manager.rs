use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::models::{CatalogItem, ItemDetail, ItemStatus, StatusMap};

use super::store::{KeyValueStore, StoreError};

/// Key holding the user's status map.
pub const STATUS_MAP_KEY: &str = "status-map";

/// Where an unreadable status map is moved so it can be recovered by hand.
pub const STATUS_MAP_QUARANTINE_KEY: &str = "status-map-corrupt";

/// A named cache partition holding one versioned payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Catalog,
    /// Detail for one display name.
    Detail(String),
}

impl Namespace {
    pub fn key(&self) -> String {
        match self {
            Namespace::Catalog => "catalog".to_string(),
            Namespace::Detail(name) => format!("detail:{}", name),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A cached payload together with the version token it was fetched under.
///
/// Payload and version live in the same stored value, so an entry is either
/// absent or complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub version: Option<String>,
    pub cached_at: DateTime<Utc>,
    pub data: T,
}

impl<T> CacheEntry<T> {
    pub fn new(version: &str, data: T) -> Self {
        Self {
            version: Some(version.to_string()),
            cached_at: Utc::now(),
            data,
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Summary of the catalog cache, for status display.
#[derive(Debug, Default)]
pub struct CacheStatus {
    pub catalog_age: Option<String>,
    pub catalog_version: Option<String>,
    pub catalog_items: usize,
    pub tracked_statuses: usize,
}

/// Typed access to the durable store.
///
/// Unreadable entries are treated as misses: they are logged, removed, and
/// `None` is returned so the caller refetches.
pub struct CacheManager<S> {
    store: S,
}

impl<S: KeyValueStore> CacheManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read cache entry, treating as miss");
                None
            }
        }
    }

    fn discard(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            error!(key = key, error = %e, "Failed to discard corrupt cache entry");
        }
    }

    /// Load a namespace's entry.
    pub fn load<T: DeserializeOwned>(&self, namespace: &Namespace) -> Option<CacheEntry<T>> {
        let key = namespace.key();
        let raw = self.read(&key)?;
        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "Discarding corrupt cache entry");
                self.discard(&key);
                None
            }
        }
    }

    /// The stored version for a namespace. Outer `None` when there is no
    /// readable entry; inner `None` when an entry exists without a version.
    /// Never writes.
    pub fn peek_version(&self, namespace: &Namespace) -> Option<Option<String>> {
        let raw = self.read(&namespace.key())?;
        match serde_json::from_str::<CacheEntry<IgnoredAny>>(&raw) {
            Ok(entry) => Some(entry.version),
            Err(e) => {
                debug!(namespace = %namespace, error = %e, "Cache entry unreadable");
                None
            }
        }
    }

    /// Write payload and version as one value.
    pub fn save<T: Serialize>(
        &self,
        namespace: &Namespace,
        version: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        let entry = CacheEntry::new(version, data);
        let contents = serde_json::to_string(&entry)?;
        self.store.set(&namespace.key(), &contents)?;
        debug!(namespace = %namespace, version = version, "Cache entry written");
        Ok(())
    }

    pub fn remove(&self, namespace: &Namespace) -> Result<(), StoreError> {
        self.store.remove(&namespace.key())
    }

    // ===== Catalog =====

    pub fn load_catalog(&self) -> Option<CacheEntry<Vec<CatalogItem>>> {
        self.load(&Namespace::Catalog)
    }

    pub fn save_catalog(&self, version: &str, items: &[CatalogItem]) -> Result<(), StoreError> {
        self.save(&Namespace::Catalog, version, &items)
    }

    // ===== Details =====

    pub fn load_detail(&self, name: &str) -> Option<CacheEntry<ItemDetail>> {
        self.load(&Namespace::Detail(name.to_string()))
    }

    pub fn save_detail(
        &self,
        name: &str,
        version: &str,
        detail: &ItemDetail,
    ) -> Result<(), StoreError> {
        self.save(&Namespace::Detail(name.to_string()), version, detail)
    }

    // ===== Status map =====

    /// Load the status map. A map that cannot be decoded is moved aside
    /// byte for byte and an empty map is returned. Any other read failure
    /// is returned, since starting empty would overwrite the stored map on
    /// the next save.
    pub fn load_statuses(&self) -> Result<StatusMap, StoreError> {
        let raw = match self.store.get(STATUS_MAP_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(StatusMap::new()),
            Err(StoreError::Unreadable { .. }) => {
                error!("Status map is not valid text, moving it aside");
                self.quarantine_statuses()?;
                return Ok(StatusMap::new());
            }
            Err(e) => return Err(e),
        };
        match serde_json::from_str::<StatusMap>(&raw) {
            Ok(statuses) => Ok(statuses),
            Err(e) => {
                error!(error = %e, "Status map is unreadable, moving it aside");
                self.quarantine_statuses()?;
                Ok(StatusMap::new())
            }
        }
    }

    fn quarantine_statuses(&self) -> Result<(), StoreError> {
        self.store.rename(STATUS_MAP_KEY, STATUS_MAP_QUARANTINE_KEY)?;
        warn!(key = STATUS_MAP_QUARANTINE_KEY, "Unreadable status map preserved");
        Ok(())
    }

    /// Persist the full status map, keys in sorted order.
    pub fn save_statuses(&self, statuses: &StatusMap) -> Result<(), StoreError> {
        let sorted: BTreeMap<&String, &ItemStatus> = statuses.iter().collect();
        let contents = serde_json::to_string(&sorted)?;
        self.store.set(STATUS_MAP_KEY, &contents)
    }

    pub fn status(&self) -> CacheStatus {
        let catalog = self.load_catalog();
        CacheStatus {
            catalog_age: catalog.as_ref().map(|c| c.age_display()),
            catalog_version: catalog.as_ref().and_then(|c| c.version.clone()),
            catalog_items: catalog.as_ref().map(|c| c.data.len()).unwrap_or(0),
            tracked_statuses: self.load_statuses().map(|s| s.len()).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
