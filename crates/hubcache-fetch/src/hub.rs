//! Hub metadata client

use hubcache_core::{HubCacheError, HubCacheResult, RemoteHubDescriptor, RepoType};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use crate::http::status_error;

/// Queries repository metadata on the upstream hub
pub struct HubClient {
    hub: RemoteHubDescriptor,
    client: reqwest::Client,
}

impl HubClient {
    /// Create a new hub client
    pub fn new(hub: RemoteHubDescriptor, timeout_secs: u64) -> HubCacheResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HubCacheError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { hub, client })
    }

    /// Fetch repository info. `None` when the hub does not know the repo.
    pub async fn get_repo_info(
        &self,
        repo_type: RepoType,
        repo_id: &str,
    ) -> HubCacheResult<Option<serde_json::Value>> {
        let url = self
            .hub
            .url_for(&format!("api/{}/{}", repo_type.plural(), repo_id));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HubCacheError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(repo_id = %repo_id, "Repository not found upstream");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(&url, status));
        }

        let info = response
            .json()
            .await
            .map_err(|e| HubCacheError::Serialization(e.to_string()))?;
        Ok(Some(info))
    }
}
