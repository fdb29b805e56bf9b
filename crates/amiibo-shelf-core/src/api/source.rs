//! The gateway seam between the engine and the remote catalog.

use async_trait::async_trait;

use crate::models::{CatalogItem, ItemDetail};

use super::ApiError;

/// Read-only access to the remote catalog and its freshness oracle.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the full catalog.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, ApiError>;

    /// Fetch detail for a display name. `Ok(None)` when the remote has none.
    async fn fetch_detail(&self, name: &str) -> Result<Option<ItemDetail>, ApiError>;

    /// Current dataset version token.
    async fn fetch_version(&self) -> Result<String, ApiError>;
}

/// A source that never reaches the network. Every call fails with
/// `ApiError::Offline`, so callers fall back to whatever is cached.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineSource;

#[async_trait]
impl RemoteSource for OfflineSource {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn fetch_detail(&self, _name: &str) -> Result<Option<ItemDetail>, ApiError> {
        Err(ApiError::Offline)
    }

    async fn fetch_version(&self) -> Result<String, ApiError> {
        Err(ApiError::Offline)
    }
}
