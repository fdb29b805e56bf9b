//! Freshness decisions for cached namespaces.
//!
//! A namespace needs refetching when nothing usable is cached, or when the
//! remote version token differs from the stored one. When the oracle cannot
//! be reached, any cached copy is used as-is.

use tracing::{debug, warn};

use crate::api::RemoteSource;

use super::manager::{CacheManager, Namespace};
use super::store::KeyValueStore;

/// Outcome of a freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing usable is cached. The oracle was not consulted.
    Missing,
    /// The oracle answered with a token that differs from the stored one,
    /// or the entry has no stored token.
    Outdated { remote_version: String },
    /// The oracle answered with the stored token.
    Current { remote_version: String },
    /// The oracle could not be reached; a cached copy exists.
    Unverified,
}

impl Freshness {
    pub fn should_refetch(&self) -> bool {
        matches!(self, Freshness::Missing | Freshness::Outdated { .. })
    }

    /// The token the oracle returned during the check, if it was reached.
    pub fn remote_version(&self) -> Option<&str> {
        match self {
            Freshness::Outdated { remote_version } | Freshness::Current { remote_version } => {
                Some(remote_version)
            }
            Freshness::Missing | Freshness::Unverified => None,
        }
    }
}

/// Check a namespace against the freshness oracle. Performs no writes.
pub async fn check_freshness<S, R>(
    cache: &CacheManager<S>,
    source: &R,
    namespace: &Namespace,
) -> Freshness
where
    S: KeyValueStore,
    R: RemoteSource + ?Sized,
{
    let Some(stored) = cache.peek_version(namespace) else {
        debug!(namespace = %namespace, "No cache found, will fetch fresh data");
        return Freshness::Missing;
    };

    match source.fetch_version().await {
        Ok(remote_version) => {
            if stored.as_deref() == Some(remote_version.as_str()) {
                debug!(namespace = %namespace, version = %remote_version, "Cache is up to date");
                Freshness::Current { remote_version }
            } else {
                debug!(
                    namespace = %namespace,
                    cached = ?stored,
                    remote = %remote_version,
                    "Cache is outdated"
                );
                Freshness::Outdated { remote_version }
            }
        }
        Err(e) => {
            warn!(namespace = %namespace, error = %e, "Freshness check failed, using cached data");
            Freshness::Unverified
        }
    }
}

/// Whether a namespace must be refetched before use.
pub async fn should_refetch<S, R>(cache: &CacheManager<S>, source: &R, namespace: &Namespace) -> bool
where
    S: KeyValueStore,
    R: RemoteSource + ?Sized,
{
    check_freshness(cache, source, namespace).await.should_refetch()
}
