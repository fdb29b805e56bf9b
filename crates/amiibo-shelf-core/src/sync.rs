//! Cache-first loading of catalog and detail data.
//!
//! 1. Check freshness - if the cached copy is current (or the oracle is
//!    unreachable), return it
//! 2. Otherwise fetch from the remote source and cache the result under the
//!    oracle's version token
//! 3. On fetch failure, fall back to whatever is cached; fail only when
//!    nothing is

use std::collections::BTreeSet;
use std::future::Future;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, RemoteSource};
use crate::cache::{check_freshness, CacheEntry, CacheManager, Freshness, KeyValueStore, Namespace};
use crate::models::{CatalogItem, ItemDetail};

/// Maximum number of concurrent detail requests during a prefetch
pub const MAX_CONCURRENT_REQUESTS: usize = 4;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to load {namespace}: {source}")]
    Unavailable {
        namespace: String,
        #[source]
        source: ApiError,
    },

    #[error("Nothing found for {0}")]
    NoDetail(String),
}

/// Where loaded data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Fresh data from the remote source
    Network,
    /// Cached data confirmed current by the oracle
    Cache,
    /// Cached data served because the remote could not be reached
    CacheOffline,
}

/// Loaded data plus where it came from.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub data: T,
    pub origin: DataOrigin,
    /// When the data was cached (if from cache)
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> Loaded<T> {
    fn from_network(data: T) -> Self {
        Self {
            data,
            origin: DataOrigin::Network,
            cached_at: None,
        }
    }

    fn from_cache(entry: CacheEntry<T>, origin: DataOrigin) -> Self {
        Self {
            data: entry.data,
            origin,
            cached_at: Some(entry.cached_at),
        }
    }
}

/// Load the catalog.
pub async fn load_catalog<S, R>(
    cache: &CacheManager<S>,
    source: &R,
) -> Result<Loaded<Vec<CatalogItem>>, SyncError>
where
    S: KeyValueStore,
    R: RemoteSource + ?Sized,
{
    let loaded = load_namespace(cache, source, Namespace::Catalog, || async {
        source.fetch_catalog().await.map(Some)
    })
    .await?;
    info!(count = loaded.data.len(), origin = ?loaded.origin, "Catalog loaded");
    Ok(loaded)
}

/// Load detail for a display name.
pub async fn load_detail<S, R>(
    cache: &CacheManager<S>,
    source: &R,
    name: &str,
) -> Result<Loaded<ItemDetail>, SyncError>
where
    S: KeyValueStore,
    R: RemoteSource + ?Sized,
{
    load_namespace(cache, source, Namespace::Detail(name.to_string()), || {
        source.fetch_detail(name)
    })
    .await
}

async fn load_namespace<T, S, R, F, Fut>(
    cache: &CacheManager<S>,
    source: &R,
    namespace: Namespace,
    fetch: F,
) -> Result<Loaded<T>, SyncError>
where
    T: Serialize + DeserializeOwned,
    S: KeyValueStore,
    R: RemoteSource + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<T>, ApiError>>,
{
    let freshness = check_freshness(cache, source, &namespace).await;

    if !freshness.should_refetch() {
        let origin = match freshness {
            Freshness::Unverified => DataOrigin::CacheOffline,
            _ => DataOrigin::Cache,
        };
        if let Some(entry) = cache.load::<T>(&namespace) {
            debug!(namespace = %namespace, "Loading data from cache");
            return Ok(Loaded::from_cache(entry, origin));
        }
        // The entry was unreadable and has been discarded; fetch instead.
    }

    match fetch().await {
        Ok(Some(data)) => {
            store_fetched(cache, source, &namespace, freshness.remote_version(), &data).await;
            Ok(Loaded::from_network(data))
        }
        Ok(None) => {
            // The remote dropped it; an older cached copy must not outlive that.
            if let Err(e) = cache.remove(&namespace) {
                warn!(namespace = %namespace, error = %e, "Failed to remove cache entry");
            }
            Err(SyncError::NoDetail(namespace.to_string()))
        }
        Err(e) => match cache.load::<T>(&namespace) {
            Some(entry) => {
                if e.is_network() {
                    warn!(namespace = %namespace, error = %e, "Remote unreachable, using cached data");
                } else {
                    warn!(namespace = %namespace, error = %e, "Remote sent unreadable data, using cached data");
                }
                Ok(Loaded::from_cache(entry, DataOrigin::CacheOffline))
            }
            None => Err(SyncError::Unavailable {
                namespace: namespace.to_string(),
                source: e,
            }),
        },
    }
}

/// Cache freshly fetched data. Nothing is written without a version token,
/// and write failures only cost the cache.
async fn store_fetched<T, S, R>(
    cache: &CacheManager<S>,
    source: &R,
    namespace: &Namespace,
    known_version: Option<&str>,
    data: &T,
) where
    T: Serialize,
    S: KeyValueStore,
    R: RemoteSource + ?Sized,
{
    let version = match known_version {
        Some(v) => v.to_string(),
        None => match source.fetch_version().await {
            Ok(v) => v,
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "No version token available, not caching");
                return;
            }
        },
    };

    if let Err(e) = cache.save(namespace, &version, data) {
        warn!(namespace = %namespace, error = %e, "Failed to write cache, continuing without it");
    }
}

/// Outcome counts for a detail prefetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub fetched: usize,
    pub cached: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Warm the detail cache for a set of display names. Duplicate names are
/// requested once. Failures are counted and logged, never returned.
pub async fn prefetch_details<S, R, I>(
    cache: &CacheManager<S>,
    source: &R,
    names: I,
) -> PrefetchSummary
where
    S: KeyValueStore,
    R: RemoteSource + ?Sized,
    I: IntoIterator<Item = String>,
{
    let names: BTreeSet<String> = names.into_iter().collect();
    debug!(count = names.len(), "Prefetching details");

    let results: Vec<(String, Result<Loaded<ItemDetail>, SyncError>)> = stream::iter(names)
        .map(move |name| async move {
            let result = load_detail(cache, source, &name).await;
            (name, result)
        })
        .buffer_unordered(MAX_CONCURRENT_REQUESTS)
        .collect()
        .await;

    let mut summary = PrefetchSummary::default();
    for (name, result) in results {
        match result {
            Ok(loaded) if loaded.origin == DataOrigin::Network => summary.fetched += 1,
            Ok(_) => summary.cached += 1,
            Err(SyncError::NoDetail(_)) => summary.missing += 1,
            Err(e) => {
                warn!(name = %name, error = %e, "Detail prefetch failed");
                summary.failed += 1;
            }
        }
    }
    info!(
        fetched = summary.fetched,
        cached = summary.cached,
        missing = summary.missing,
        failed = summary.failed,
        "Detail prefetch complete"
    );
    summary
}

/// Tracks the request a consumer is currently waiting on, so results that
/// arrive after the consumer moved on can be dropped.
#[derive(Debug, Default)]
pub struct RequestGuard {
    current: Option<RequestTicket>,
    next_id: u64,
}

/// Handle for one in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    id: u64,
    namespace: Namespace,
}

impl RequestTicket {
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl RequestGuard {
    /// Start a request, superseding any previous one.
    pub fn begin(&mut self, namespace: Namespace) -> RequestTicket {
        self.next_id += 1;
        let ticket = RequestTicket {
            id: self.next_id,
            namespace,
        };
        self.current = Some(ticket.clone());
        ticket
    }

    /// Stop waiting on any request.
    pub fn cancel(&mut self) {
        self.current = None;
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.current.as_ref() == Some(ticket)
    }

    /// Finish a request. Returns false (and the result should be dropped)
    /// when the ticket was superseded or cancelled.
    pub fn complete(&mut self, ticket: &RequestTicket) -> bool {
        if self.is_current(ticket) {
            self.current = None;
            true
        } else {
            debug!(namespace = %ticket.namespace, "Dropping stale result");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, StoreError};
    use crate::testing::{item, FakeSource};

    #[tokio::test]
    async fn test_first_load_fetches_and_caches() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1").with_catalog(vec![item("1", "a", "Mario")]);

        let loaded = load_catalog(&cache, &source).await.unwrap();
        assert_eq!(loaded.origin, DataOrigin::Network);
        assert_eq!(loaded.data.len(), 1);

        let entry = cache.load_catalog().unwrap();
        assert_eq!(entry.version.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_unchanged_version_uses_cache() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1").with_catalog(vec![item("1", "a", "Mario")]);

        load_catalog(&cache, &source).await.unwrap();
        let second = load_catalog(&cache, &source).await.unwrap();
        let third = load_catalog(&cache, &source).await.unwrap();

        assert_eq!(second.origin, DataOrigin::Cache);
        assert_eq!(third.origin, DataOrigin::Cache);
        assert!(second.cached_at.is_some());
        assert_eq!(source.catalog_calls(), 1);
    }

    #[tokio::test]
    async fn test_new_version_refetches() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1").with_catalog(vec![item("1", "a", "Mario")]);
        load_catalog(&cache, &source).await.unwrap();

        source.set_version("v2");
        source.set_catalog(vec![item("1", "a", "Mario"), item("2", "b", "Luigi")]);

        let loaded = load_catalog(&cache, &source).await.unwrap();
        assert_eq!(loaded.origin, DataOrigin::Network);
        assert_eq!(loaded.data.len(), 2);
        assert_eq!(source.catalog_calls(), 2);
        assert_eq!(cache.load_catalog().unwrap().version.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_offline_with_cache_serves_cache() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1").with_catalog(vec![item("1", "a", "Mario")]);
        load_catalog(&cache, &source).await.unwrap();

        source.set_offline(true);
        let loaded = load_catalog(&cache, &source).await.unwrap();
        assert_eq!(loaded.origin, DataOrigin::CacheOffline);
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(source.catalog_calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_without_cache_fails() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1");
        source.set_offline(true);

        let err = load_catalog(&cache, &source).await.unwrap_err();
        assert!(matches!(err, SyncError::Unavailable { .. }));
        // Attempted at least once
        assert_eq!(source.catalog_calls(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_replaced() {
        let cache = CacheManager::new(MemoryStore::new());
        cache
            .store()
            .set("catalog", r#"{"version":"v1","cached_at":"2024-01-01T00:00:00Z","data":"oops"}"#)
            .unwrap();
        let source = FakeSource::new("v1").with_catalog(vec![item("1", "a", "Mario")]);

        // Oracle says current, but the payload is unreadable: refetch.
        let loaded = load_catalog(&cache, &source).await.unwrap();
        assert_eq!(loaded.origin, DataOrigin::Network);
        assert_eq!(cache.load_catalog().unwrap().data.len(), 1);
    }

    #[tokio::test]
    async fn test_quota_failure_still_returns_data() {
        let cache = CacheManager::new(MemoryStore::with_quota(8));
        let source = FakeSource::new("v1").with_catalog(vec![item("1", "a", "Mario")]);

        let loaded = load_catalog(&cache, &source).await.unwrap();
        assert_eq!(loaded.data.len(), 1);
        assert!(cache.load_catalog().is_none());
        assert!(matches!(
            cache.save_catalog("v1", &loaded.data),
            Err(StoreError::QuotaExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_detail_load_and_not_found() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1");
        source.add_detail(ItemDetail {
            name: "Mario".to_string(),
            ..Default::default()
        });

        let loaded = load_detail(&cache, &source, "Mario").await.unwrap();
        assert_eq!(loaded.origin, DataOrigin::Network);
        assert_eq!(cache.load_detail("Mario").unwrap().version.as_deref(), Some("v1"));

        let again = load_detail(&cache, &source, "Mario").await.unwrap();
        assert_eq!(again.origin, DataOrigin::Cache);
        assert_eq!(source.detail_calls(), 1);

        let err = load_detail(&cache, &source, "Nobody").await.unwrap_err();
        assert!(matches!(err, SyncError::NoDetail(_)));
        assert!(cache.load_detail("Nobody").is_none());
    }

    #[tokio::test]
    async fn test_detail_dropped_by_remote_is_removed() {
        let cache = CacheManager::new(MemoryStore::new());
        cache
            .save_detail(
                "Mario",
                "v1",
                &ItemDetail {
                    name: "Mario".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        // New dataset version no longer lists Mario
        let source = FakeSource::new("v2");

        let err = load_detail(&cache, &source, "Mario").await.unwrap_err();
        assert!(matches!(err, SyncError::NoDetail(_)));
        assert!(cache.load_detail("Mario").is_none());
        assert_eq!(cache.peek_version(&Namespace::Detail("Mario".to_string())), None);
    }

    #[tokio::test]
    async fn test_detail_fetch_failure_falls_back() {
        let cache = CacheManager::new(MemoryStore::new());
        cache
            .save_detail(
                "Mario",
                "v1",
                &ItemDetail {
                    name: "Mario".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        // Version moved on, but the detail endpoint is down
        let source = FakeSource::new("v2");
        source.set_offline(true);

        let loaded = load_detail(&cache, &source, "Mario").await.unwrap();
        assert_eq!(loaded.origin, DataOrigin::CacheOffline);
        assert_eq!(loaded.data.name, "Mario");
    }

    #[tokio::test]
    async fn test_prefetch_counts_outcomes() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1");
        for name in ["Mario", "Luigi"] {
            source.add_detail(ItemDetail {
                name: name.to_string(),
                ..Default::default()
            });
        }
        let names = ["Mario", "Luigi", "Mario", "Nobody"].map(String::from);

        let first = prefetch_details(&cache, &source, names.clone()).await;
        assert_eq!(
            first,
            PrefetchSummary {
                fetched: 2,
                cached: 0,
                missing: 1,
                failed: 0
            }
        );
        assert_eq!(source.detail_calls(), 3);

        let second = prefetch_details(&cache, &source, names).await;
        assert_eq!(second.cached, 2);
        assert_eq!(second.missing, 1);
    }

    #[tokio::test]
    async fn test_prefetch_offline_without_cache_fails_quietly() {
        let cache = CacheManager::new(MemoryStore::new());
        let source = FakeSource::new("v1");
        source.set_offline(true);

        let summary = prefetch_details(&cache, &source, vec!["Mario".to_string()]).await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fetched, 0);
    }

    #[test]
    fn test_request_guard_drops_superseded() {
        let mut guard = RequestGuard::default();
        let first = guard.begin(Namespace::Detail("Mario".to_string()));
        let second = guard.begin(Namespace::Detail("Luigi".to_string()));

        assert!(!guard.is_current(&first));
        assert!(!guard.complete(&first));
        assert!(guard.complete(&second));
        // Completing twice is stale
        assert!(!guard.complete(&second));
    }

    #[test]
    fn test_request_guard_cancel() {
        let mut guard = RequestGuard::default();
        let ticket = guard.begin(Namespace::Catalog);
        guard.cancel();
        assert!(!guard.complete(&ticket));
        assert_eq!(ticket.namespace(), &Namespace::Catalog);
    }
}
