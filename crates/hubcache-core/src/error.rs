//! Error types for hubcache

use thiserror::Error;

use crate::path::RequestKind;

/// Main error type for hubcache
#[derive(Error, Debug)]
pub enum HubCacheError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A content operation was attempted on a path that does not name a file
    #[error("Path is not fetchable content ({kind}): {path}")]
    NotFetchable { path: String, kind: RequestKind },

    /// Path matches no recognized hub grammar
    #[error("Unsupported path: {0}")]
    UnsupportedPath(String),

    /// Upstream hub answered 404
    #[error("Not found upstream: {0}")]
    UpstreamNotFound(String),

    /// Upstream hub answered with a non-success status
    #[error("Upstream error {status} for {url}")]
    Upstream { url: String, status: u16 },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for hubcache operations
pub type HubCacheResult<T> = Result<T, HubCacheError>;

impl From<serde_json::Error> for HubCacheError {
    fn from(err: serde_json::Error) -> Self {
        HubCacheError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for HubCacheError {
    fn from(err: toml::de::Error) -> Self {
        HubCacheError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HubCacheError::Config("invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: invalid config");

        let err = HubCacheError::NotFetchable {
            path: "api/models/x/y".to_string(),
            kind: RequestKind::Api,
        };
        assert_eq!(
            err.to_string(),
            "Path is not fetchable content (api): api/models/x/y"
        );

        let err = HubCacheError::Upstream {
            url: "https://hub/x".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "Upstream error 503 for https://hub/x");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HubCacheError = io_err.into();
        assert!(matches!(err, HubCacheError::Io(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let err: HubCacheError = toml::from_str::<toml::Value>("= broken")
            .unwrap_err()
            .into();
        assert!(matches!(err, HubCacheError::Config(_)));
    }
}
