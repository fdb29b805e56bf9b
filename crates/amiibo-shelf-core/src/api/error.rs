use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Malformed JSON from {url}: {source}")]
    Parse {
        url: String,
        source: serde_json::Error,
    },

    #[error("Unexpected response shape from {url}: {source}")]
    SchemaMismatch {
        url: String,
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Remote source disabled (offline mode)")]
    Offline,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Split JSON failures into syntax errors and well-formed JSON of the
    /// wrong shape.
    pub fn from_json(url: &str, source: serde_json::Error) -> Self {
        let url = url.to_string();
        match source.classify() {
            serde_json::error::Category::Data => ApiError::SchemaMismatch { url, source },
            _ => ApiError::Parse { url, source },
        }
    }

    /// Whether the remote could not be reached or refused the request, as
    /// opposed to answering with something unreadable.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ApiError::NetworkError(_)
                | ApiError::NotFound(_)
                | ApiError::RateLimited
                | ApiError::ServerError(_)
                | ApiError::InvalidResponse(_)
                | ApiError::Offline
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_codes() {
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::NOT_FOUND, "nope"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(reqwest::StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
        assert!(truncated.contains(&format!("{} total bytes", long.len())));
        assert_eq!(ApiError::truncate_body("short"), "short");
    }

    #[test]
    fn test_from_json_classifies() {
        let syntax = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(
            ApiError::from_json("u", syntax),
            ApiError::Parse { .. }
        ));

        let shape = serde_json::from_str::<Vec<String>>("{\"a\": 1}").unwrap_err();
        assert!(matches!(
            ApiError::from_json("u", shape),
            ApiError::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn test_is_network() {
        assert!(ApiError::Offline.is_network());
        assert!(ApiError::RateLimited.is_network());
        assert!(ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "").is_network());

        let syntax = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(!ApiError::from_json("u", syntax).is_network());
        let shape = serde_json::from_str::<Vec<String>>("{}").unwrap_err();
        assert!(!ApiError::from_json("u", shape).is_network());
    }
}
