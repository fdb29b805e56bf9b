//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ApiError, RemoteSource};
use crate::models::{CatalogItem, ItemDetail};

/// How `FakeSource::fetch_version` misbehaves when told to.
#[derive(Debug, Clone, Copy)]
pub enum VersionFailure {
    /// Body is not JSON
    Malformed,
    /// Body is JSON of the wrong shape
    WrongShape,
}

/// In-memory `RemoteSource` with call counters and a network switch.
pub struct FakeSource {
    version: Mutex<String>,
    catalog: Mutex<Vec<CatalogItem>>,
    details: Mutex<HashMap<String, ItemDetail>>,
    offline: AtomicBool,
    version_failure: Mutex<Option<VersionFailure>>,
    catalog_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    version_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(version: &str) -> Self {
        Self {
            version: Mutex::new(version.to_string()),
            catalog: Mutex::default(),
            details: Mutex::default(),
            offline: AtomicBool::new(false),
            version_failure: Mutex::new(None),
            catalog_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            version_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_catalog(self, items: Vec<CatalogItem>) -> Self {
        self.set_catalog(items);
        self
    }

    pub fn set_catalog(&self, items: Vec<CatalogItem>) {
        *self.catalog.lock().unwrap() = items;
    }

    pub fn set_version(&self, version: &str) {
        *self.version.lock().unwrap() = version.to_string();
    }

    pub fn add_detail(&self, detail: ItemDetail) {
        self.details
            .lock()
            .unwrap()
            .insert(detail.name.clone(), detail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fail_version(&self, failure: Option<VersionFailure>) {
        *self.version_failure.lock().unwrap() = failure;
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn version_calls(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ApiError::Offline)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteSource for FakeSource {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, ApiError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn fetch_detail(&self, name: &str) -> Result<Option<ItemDetail>, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.details.lock().unwrap().get(name).cloned())
    }

    async fn fetch_version(&self) -> Result<String, ApiError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if let Some(failure) = *self.version_failure.lock().unwrap() {
            let body = match failure {
                VersionFailure::Malformed => "{\"lastUpdated\": ",
                VersionFailure::WrongShape => "[1, 2]",
            };
            let source = serde_json::from_str::<String>(body).unwrap_err();
            return Err(ApiError::from_json("fake://lastupdated", source));
        }
        Ok(self.version.lock().unwrap().clone())
    }
}

/// A catalog item with only the identifying fields filled in.
pub fn item(head: &str, tail: &str, name: &str) -> CatalogItem {
    CatalogItem {
        identifier: CatalogItem::identifier_for(head, tail),
        display_name: name.to_string(),
        image_url: format!("https://example.test/{}{}.png", head, tail),
        character: name.to_string(),
        game_series: "Super Mario".to_string(),
        amiibo_series: "Super Smash Bros.".to_string(),
        item_type: "Figure".to_string(),
        release: Default::default(),
    }
}
