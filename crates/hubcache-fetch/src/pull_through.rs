//! Pull-through executor
//!
//! Serves hub paths: fetchable content comes from the store, or is fetched
//! once upstream and stored; metadata is proxied and never stored.
//! Concurrent misses on the same cache key share a single upstream fetch.

use hubcache_core::{
    classify, CacheKey, ContentRecord, FetchDecision, HubCacheError, HubCacheResult,
    PathDescriptor, RemoteHubDescriptor,
};
use hubcache_store::{ContentStore, StoredContent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::traits::{FetchedBlob, Fetcher};

/// Result of serving a path
#[derive(Debug)]
pub enum Served {
    /// File content; `hit` is false when this request populated the cache
    Content {
        content: StoredContent,
        data: Vec<u8>,
        hit: bool,
    },
    /// Proxied hub metadata
    Metadata(FetchedBlob),
}

/// Pull-through cache in front of the upstream hub
pub struct PullThrough {
    hub: RemoteHubDescriptor,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ContentStore>,
    /// Per-key locks for misses currently being fetched
    inflight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl PullThrough {
    /// Create a new pull-through executor
    pub fn new(
        hub: RemoteHubDescriptor,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        info!(
            hub = %hub.base_url,
            fetcher = fetcher.name(),
            store = store.name(),
            "Pull-through cache initialized"
        );

        Self {
            hub,
            fetcher,
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn hub(&self) -> &RemoteHubDescriptor {
        &self.hub
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Serve a relative hub path. A query string, if present, plays no part
    /// in classification and is forwarded with metadata requests.
    pub async fn serve(&self, target: &str) -> HubCacheResult<Served> {
        let path = target.split_once('?').map_or(target, |(path, _)| path);
        match classify(path) {
            FetchDecision::Fetchable(descriptor) => self.serve_content(&descriptor).await,
            FetchDecision::MetadataOnly => {
                let url = self.hub.url_for(target);
                debug!(url = %url, "Proxying metadata request");
                Ok(Served::Metadata(self.fetcher.fetch(&url).await?))
            }
            FetchDecision::Unsupported => Err(HubCacheError::UnsupportedPath(path.to_string())),
        }
    }

    async fn cached(&self, key: &CacheKey) -> HubCacheResult<Option<Served>> {
        let Some(content) = self.store.get(key).await? else {
            return Ok(None);
        };
        let data = self.store.read(&content).await?;
        Ok(Some(Served::Content {
            content,
            data,
            hit: true,
        }))
    }

    async fn serve_content(&self, descriptor: &PathDescriptor) -> HubCacheResult<Served> {
        let key = CacheKey::from_descriptor(descriptor)?;
        if let Some(served) = self.cached(&key).await? {
            debug!(key = %key, "Cache hit");
            return Ok(served);
        }

        let lock = self.key_lock(&key).await;
        let result = {
            let _guard = lock.lock().await;
            match self.cached(&key).await {
                // Another request fetched it while we waited.
                Ok(Some(served)) => Ok(served),
                Ok(None) => self.fetch_and_store(descriptor, &key).await,
                Err(e) => Err(e),
            }
        };
        self.release_key_lock(&key, lock).await;

        result
    }

    async fn fetch_and_store(
        &self,
        descriptor: &PathDescriptor,
        key: &CacheKey,
    ) -> HubCacheResult<Served> {
        let url = self.hub.resolve(&descriptor.to_string());
        info!(key = %key, url = %url, "Cache miss, fetching upstream");

        let blob = self.fetcher.fetch(&url).await?;
        let record = ContentRecord::from_fetch(descriptor, blob.size())?;
        let content = self.store.put(record, &blob.data).await?;

        Ok(Served::Content {
            content,
            data: blob.data,
            hit: false,
        })
    }

    async fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight.entry(key.clone()).or_default().clone()
    }

    async fn release_key_lock(&self, key: &CacheKey, lock: Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        drop(lock);
        if inflight
            .get(key)
            .is_some_and(|existing| Arc::strong_count(existing) == 1)
        {
            inflight.remove(key);
        }
    }

    #[cfg(test)]
    async fn inflight_len(&self) -> usize {
        self.inflight.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticFetcher;
    use hubcache_core::RepoType;
    use hubcache_store::ContentCache;
    use std::time::Duration;
    use tempfile::TempDir;

    const HUB: &str = "https://hub.test";
    const CONFIG_URL: &str = "https://hub.test/models/org/repo/resolve/main/config.json";

    async fn pull_through(dir: &TempDir, fetcher: Arc<StaticFetcher>) -> PullThrough {
        let cache = ContentCache::new(dir.path().to_path_buf(), 1024 * 1024, true);
        cache.init().await.unwrap();
        PullThrough::new(RemoteHubDescriptor::new(HUB), fetcher, Arc::new(cache))
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::default().with(CONFIG_URL, b"{}"));
        let pt = pull_through(&dir, fetcher.clone()).await;

        match pt.serve("org/repo/resolve/main/config.json").await.unwrap() {
            Served::Content { content, data, hit } => {
                assert!(!hit);
                assert_eq!(data, b"{}".to_vec());
                assert_eq!(content.record.repo_type, RepoType::Model);
                assert_eq!(content.record.size_bytes, 2);
            }
            other => panic!("expected content, got {:?}", other),
        }

        // Prefixed spelling of the same file is the same key.
        match pt
            .serve("models/org/repo/resolve/main/config.json")
            .await
            .unwrap()
        {
            Served::Content { hit, .. } => assert!(hit),
            other => panic!("expected content, got {:?}", other),
        }

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(pt.store().list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            StaticFetcher::default()
                .with(CONFIG_URL, b"{\"a\":1}")
                .with_delay(Duration::from_millis(50)),
        );
        let pt = Arc::new(pull_through(&dir, fetcher.clone()).await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pt = pt.clone();
                tokio::spawn(async move { pt.serve("org/repo/resolve/main/config.json").await })
            })
            .collect();

        let mut misses = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                Served::Content { data, hit, .. } => {
                    assert_eq!(data, b"{\"a\":1}".to_vec());
                    if !hit {
                        misses += 1;
                    }
                }
                other => panic!("expected content, got {:?}", other),
            }
        }

        assert_eq!(misses, 1);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(pt.inflight_len().await, 0);
    }

    #[tokio::test]
    async fn test_metadata_is_proxied_not_stored() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            StaticFetcher::default().with("https://hub.test/api/models/org/repo", b"{\"id\":1}"),
        );
        let pt = pull_through(&dir, fetcher.clone()).await;

        for _ in 0..2 {
            match pt.serve("api/models/org/repo").await.unwrap() {
                Served::Metadata(blob) => assert_eq!(blob.data, b"{\"id\":1}".to_vec()),
                other => panic!("expected metadata, got {:?}", other),
            }
        }

        assert_eq!(fetcher.calls(), 2);
        assert!(pt.store().list().await.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_keeps_query_string() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::default().with(
            "https://hub.test/api/models/org/repo?expand%5B%5D=siblings",
            b"{\"siblings\":[]}",
        ));
        let pt = pull_through(&dir, fetcher.clone()).await;

        match pt.serve("api/models/org/repo?expand%5B%5D=siblings").await.unwrap() {
            Served::Metadata(blob) => assert_eq!(blob.data, b"{\"siblings\":[]}".to_vec()),
            other => panic!("expected metadata, got {:?}", other),
        }

        // Content keys ignore the query.
        let fetcher = Arc::new(StaticFetcher::default().with(CONFIG_URL, b"{}"));
        let pt = pull_through(&dir, fetcher.clone()).await;
        match pt
            .serve("org/repo/resolve/main/config.json?download=true")
            .await
            .unwrap()
        {
            Served::Content { content, .. } => {
                assert_eq!(content.record.relative_path, "config.json")
            }
            other => panic!("expected content, got {:?}", other),
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_path() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::default());
        let pt = pull_through(&dir, fetcher.clone()).await;

        let err = pt.serve("favicon.ico").await.unwrap_err();
        assert!(matches!(err, HubCacheError::UnsupportedPath(_)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::default());
        let pt = pull_through(&dir, fetcher.clone()).await;

        for _ in 0..2 {
            let err = pt
                .serve("org/missing/resolve/main/x.bin")
                .await
                .unwrap_err();
            assert!(matches!(err, HubCacheError::UpstreamNotFound(_)));
        }

        assert_eq!(fetcher.calls(), 2);
        assert!(pt.store().list().await.is_empty());
        assert_eq!(pt.inflight_len().await, 0);
    }
}
