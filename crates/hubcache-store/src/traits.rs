//! Storage trait definitions

use async_trait::async_trait;
use hubcache_core::{CacheKey, ContentRecord, HubCacheResult};

use crate::cache::{CacheStats, StoredContent};

/// Durable storage for fetched content, keyed by [`CacheKey`]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up a stored entry
    async fn get(&self, key: &CacheKey) -> HubCacheResult<Option<StoredContent>>;

    /// Read the bytes behind a stored entry
    async fn read(&self, content: &StoredContent) -> HubCacheResult<Vec<u8>>;

    /// Store a record and its bytes. If the key is already present the
    /// existing entry is returned unchanged.
    async fn put(&self, record: ContentRecord, data: &[u8]) -> HubCacheResult<StoredContent>;

    /// Drop an entry
    async fn remove(&self, key: &CacheKey) -> HubCacheResult<()>;

    /// All stored records
    async fn list(&self) -> Vec<ContentRecord>;

    /// Usage statistics
    async fn stats(&self) -> CacheStats;

    /// Get the store name
    fn name(&self) -> &'static str;
}
