//! Data models for amiibo catalog entities and collection state.
//!
//! This module contains the structures used across the engine:
//!
//! - `CatalogItem`: an immutable catalog record keyed by its identifier
//! - `ItemDetail`, `GameUsage`: per-item detail fetched on demand
//! - `ReleaseDates`, `Region`, `Platform`: enumerated-key maps for the
//!   optional per-region and per-platform fields the API returns
//! - `ItemStatus`, `StatusMap`, `CollectionItem`: user collection state
//!
//! API response shapes live next to their domain type and are converted
//! at the gateway boundary, so cached snapshots only ever hold domain types.

pub mod catalog;
pub mod detail;
pub mod release;
pub mod status;

pub use catalog::{CatalogItem, CatalogResponse};
pub use detail::{DetailResponse, GameUsage, ItemDetail, Platform};
pub use release::{Region, ReleaseDates};
pub use status::{CollectionItem, ItemStatus, StatusMap};
