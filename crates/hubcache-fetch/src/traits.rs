//! Fetcher trait definitions

use async_trait::async_trait;
use hubcache_core::HubCacheResult;

/// Bytes returned by the upstream hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBlob {
    pub data: Vec<u8>,
    /// Content type reported upstream, if any
    pub content_type: Option<String>,
}

impl FetchedBlob {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Performs upstream transfers
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full body at `url`
    async fn fetch(&self, url: &str) -> HubCacheResult<FetchedBlob>;

    /// Get the fetcher name
    fn name(&self) -> &'static str;
}
