//! Remote source gateway.
//!
//! This module provides the `RemoteSource` trait the engine depends on and
//! `ApiClient`, its HTTP implementation against the public amiibo API.
//! The API is read-only and unauthenticated; it exposes the catalog, a
//! per-name detail lookup, and a single "last updated" version token that
//! serves as the freshness oracle for both.

pub mod client;
pub mod error;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::{OfflineSource, RemoteSource};
