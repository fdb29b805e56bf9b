//! Amiibo Shelf Core - offline-first amiibo collection tracking.
//!
//! This crate holds everything the front-ends share: the gateway to the
//! public amiibo API, the versioned on-disk cache, the collection state and
//! its persistence, share tokens, and import/export files.
//!
//! Data flows one way: `sync` decides between cache and network for
//! catalog and detail data, `collection::Tracker` joins the catalog with
//! the user's statuses, and every status change reaches the store before
//! the in-memory view moves.

pub mod api;
pub mod cache;
pub mod collection;
pub mod config;
pub mod models;
pub mod share;
pub mod sync;
pub mod transfer;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types at crate root
pub use api::{ApiClient, ApiError, OfflineSource, RemoteSource};
pub use cache::{CacheManager, FileStore, Freshness, KeyValueStore, MemoryStore, Namespace, StoreError};
pub use collection::{Filter, Stats, Tracker, TrackerError, ViewMode};
pub use config::Config;
pub use models::{CatalogItem, CollectionItem, ItemDetail, ItemStatus, StatusMap};
pub use share::DecodeError;
pub use sync::{DataOrigin, Loaded, PrefetchSummary, SyncError};
pub use transfer::TransferError;
