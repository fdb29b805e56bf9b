//! API client for the public amiibo REST API.
//!
//! This module provides the `ApiClient` struct, the HTTP implementation of
//! `RemoteSource`. Request timeouts are left at the transport default.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::models::{CatalogItem, CatalogResponse, DetailResponse, ItemDetail};

use super::{ApiError, RemoteSource};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the public amiibo API.
pub const DEFAULT_API_BASE_URL: &str = "https://www.amiiboapi.com/api/";

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const USER_AGENT: &str = concat!("amiibo-shelf/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastUpdatedResponse {
    last_updated: String,
}

/// API client for the amiibo catalog.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: Self::normalize_base(base_url)?,
        })
    }

    /// Parse the base URL, making sure relative joins keep its last segment.
    fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
        if base_url.ends_with('/') {
            Ok(Url::parse(base_url)?)
        } else {
            Ok(Url::parse(&format!("{}/", base_url))?)
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn catalog_url(&self) -> Result<Url, ApiError> {
        Ok(self.base_url.join("amiibo/")?)
    }

    fn detail_url(&self, name: &str) -> Result<Url, ApiError> {
        let mut url = self.base_url.join("amiibo/")?;
        url.query_pairs_mut()
            .append_pair("name", name)
            .append_key_only("showusage")
            .append_key_only("showgames");
        Ok(url)
    }

    fn version_url(&self) -> Result<Url, ApiError> {
        Ok(self.base_url.join("lastupdated/")?)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url.clone())
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text)
                        .map_err(|e| ApiError::from_json(url.as_str(), e));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }
}

#[async_trait]
impl RemoteSource for ApiClient {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, ApiError> {
        let response: CatalogResponse = self.get(self.catalog_url()?).await?;
        debug!(count = response.amiibo.len(), "Catalog response received");
        Ok(response.amiibo.iter().map(|r| r.to_item()).collect())
    }

    async fn fetch_detail(&self, name: &str) -> Result<Option<ItemDetail>, ApiError> {
        // The API answers an unknown name with 404 rather than an empty list.
        let response: DetailResponse = match self.get(self.detail_url(name)?).await {
            Ok(response) => response,
            Err(ApiError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        debug!(name = name, count = response.amiibo.len(), "Detail response received");
        Ok(response.amiibo.first().map(|r| r.to_detail()))
    }

    async fn fetch_version(&self) -> Result<String, ApiError> {
        let response: LastUpdatedResponse = self.get(self.version_url()?).await?;
        Ok(response.last_updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_under_base() {
        let client = ApiClient::new("https://example.test/api").unwrap();
        assert_eq!(client.base_url().as_str(), "https://example.test/api/");
        assert_eq!(
            client.catalog_url().unwrap().as_str(),
            "https://example.test/api/amiibo/"
        );
        assert_eq!(
            client.version_url().unwrap().as_str(),
            "https://example.test/api/lastupdated/"
        );
    }

    #[test]
    fn test_detail_url_escapes_name() {
        let client = ApiClient::new(DEFAULT_API_BASE_URL).unwrap();
        let url = client.detail_url("Mario & Luigi").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.amiiboapi.com/api/amiibo/?name=Mario+%26+Luigi&showusage&showgames"
        );
    }

    #[test]
    fn test_parse_last_updated() {
        let resp: LastUpdatedResponse =
            serde_json::from_str(r#"{"lastUpdated": "2024-03-18T16:23:47.826046"}"#).unwrap();
        assert_eq!(resp.last_updated, "2024-03-18T16:23:47.826046");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
