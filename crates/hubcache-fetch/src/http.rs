//! HTTP fetcher for the upstream hub

use async_trait::async_trait;
use hubcache_core::{HubCacheError, HubCacheResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::traits::{FetchedBlob, Fetcher};

/// Fetches upstream content over HTTP
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a new fetcher with a per-request timeout
    pub fn new(timeout_secs: u64) -> HubCacheResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("hubcache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HubCacheError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Map a non-success upstream status onto the error taxonomy
pub(crate) fn status_error(url: &str, status: StatusCode) -> HubCacheError {
    if status == StatusCode::NOT_FOUND {
        HubCacheError::UpstreamNotFound(url.to_string())
    } else {
        HubCacheError::Upstream {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> HubCacheResult<FetchedBlob> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Upstream request failed");
            HubCacheError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Upstream returned an error");
            return Err(status_error(url, status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response
            .bytes()
            .await
            .map_err(|e| HubCacheError::Network(e.to_string()))?
            .to_vec();

        debug!(url = %url, size = data.len(), "Fetched from upstream");

        Ok(FetchedBlob { data, content_type })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_upstream;

    #[test]
    fn test_http_fetcher_creation() {
        let fetcher = HttpFetcher::new(10).unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(10));
        assert_eq!(fetcher.name(), "http");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let base = spawn_upstream().await;
        let fetcher = HttpFetcher::new(5).unwrap();

        let blob = fetcher
            .fetch(&format!("{base}/models/org/repo/resolve/main/config.json"))
            .await
            .unwrap();
        assert_eq!(blob.data, br#"{"model_type":"gpt2"}"#.to_vec());
        assert_eq!(blob.content_type.as_deref(), Some("application/json"));
        assert_eq!(blob.size(), 21);
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let base = spawn_upstream().await;
        let fetcher = HttpFetcher::new(5).unwrap();

        let err = fetcher
            .fetch(&format!("{base}/models/org/missing/resolve/main/x.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, HubCacheError::UpstreamNotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_upstream_error() {
        let base = spawn_upstream().await;
        let fetcher = HttpFetcher::new(5).unwrap();

        let err = fetcher.fetch(&format!("{base}/broken")).await.unwrap_err();
        assert!(matches!(err, HubCacheError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_unreachable() {
        let fetcher = HttpFetcher::new(1).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:9/x").await.unwrap_err();
        assert!(matches!(err, HubCacheError::Network(_)));
    }
}
