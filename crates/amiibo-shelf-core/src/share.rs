//! Share tokens: an owned-identifier set packed into a URL-safe string.
//!
//! The set is written as a JSON array of strings, deflate-compressed, then
//! base64 encoded with the URL-safe alphabet and no padding. The result can
//! be placed in a query string without escaping.

use std::collections::HashSet;
use std::io::{self, Read};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Query parameter carrying a share token.
pub const SHARE_QUERY_PARAM: &str = "collection";

/// Upper bound on the decompressed payload of a token.
const MAX_DECODED_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Share token is corrupt: {0}")]
    Corrupt(String),

    #[error("Share token does not contain a list of identifiers: {0}")]
    SchemaMismatch(String),
}

/// Encode identifiers into a share token. Duplicates are dropped; the
/// first occurrence keeps its position.
pub fn encode<I, T>(identifiers: I) -> io::Result<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut seen = HashSet::new();
    let list: Vec<Value> = identifiers
        .into_iter()
        .filter_map(|id| {
            let id: &str = id.as_ref();
            seen.insert(id.to_string())
                .then(|| Value::String(id.to_string()))
        })
        .collect();
    let json = Value::Array(list).to_string();

    let mut compressed = Vec::new();
    DeflateEncoder::new(json.as_bytes(), Compression::best()).read_to_end(&mut compressed)?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Decode a share token back into its identifier set.
pub fn decode(token: &str) -> Result<HashSet<String>, DecodeError> {
    let compressed = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| DecodeError::Corrupt(format!("invalid base64: {}", e)))?;

    let mut json = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_BYTES + 1)
        .read_to_end(&mut json)
        .map_err(|e| DecodeError::Corrupt(format!("invalid compressed data: {}", e)))?;
    if json.len() as u64 > MAX_DECODED_BYTES {
        return Err(DecodeError::Corrupt("payload too large".to_string()));
    }

    let value: Value = serde_json::from_slice(&json)
        .map_err(|e| DecodeError::Corrupt(format!("invalid JSON: {}", e)))?;

    let Value::Array(list) = value else {
        return Err(DecodeError::SchemaMismatch("expected an array".to_string()));
    };
    list.into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s),
            other => Err(DecodeError::SchemaMismatch(format!(
                "expected a string, found {}",
                other
            ))),
        })
        .collect()
}

/// Build a share URL: `base` with the token in the `collection` parameter.
/// Any existing `collection` parameter is replaced.
pub fn share_url(base: &str, token: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != SHARE_QUERY_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(SHARE_QUERY_PARAM, token);
    Ok(url)
}

/// Pull the share token out of a URL. Returns None when the input is not a
/// URL or carries no `collection` parameter.
pub fn token_from_url(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == SHARE_QUERY_PARAM)
        .map(|(_, v)| v.into_owned())
}

/// Accept either a full share URL or a bare token.
pub fn token_from_input(input: &str) -> String {
    token_from_url(input).unwrap_or_else(|| input.trim().to_string())
}
