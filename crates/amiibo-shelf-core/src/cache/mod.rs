//! Local caching module for offline data access.
//!
//! This module provides the durable key/value store, the typed
//! `CacheManager` over it, and the freshness checks that decide when a
//! cached namespace must be refetched.
//!
//! Cached namespaces:
//! - `catalog`: the full catalog and the version token it was fetched under
//! - `detail:<name>`: one detail record per display name, with its own token
//! - `status-map`: the user's per-identifier flags (not versioned)

pub mod freshness;
pub mod manager;
pub mod store;

pub use freshness::{check_freshness, should_refetch, Freshness};
pub use manager::{CacheEntry, CacheManager, CacheStatus, Namespace, STATUS_MAP_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
