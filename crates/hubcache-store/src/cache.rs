//! Disk-backed content cache
//!
//! Blobs are content-addressed by sha256 under `<base>/blobs/<aa>/<sha256>`,
//! so the same bytes fetched under several revisions are stored once. The
//! record index lives in memory and is mirrored to `<base>/index.json`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hubcache_core::{CacheKey, ContentRecord, HubCacheError, HubCacheResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::traits::ContentStore;

const INDEX_FILE: &str = "index.json";
const BLOBS_DIR: &str = "blobs";

/// Cached content metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContent {
    /// Record describing the file
    pub record: ContentRecord,
    /// Hex sha256 of the bytes
    pub sha256: String,
    /// Path to the blob file
    pub path: PathBuf,
    /// Download time
    pub downloaded_at: DateTime<Utc>,
    /// Last access time
    pub last_accessed: DateTime<Utc>,
}

#[derive(Default)]
struct Index {
    entries: HashMap<CacheKey, StoredContent>,
    /// sha256 -> number of entries sharing the blob
    blob_refs: HashMap<String, usize>,
    /// Bytes on disk, each blob counted once
    total_size: u64,
}

impl Index {
    fn insert(&mut self, content: StoredContent) {
        let refs = self.blob_refs.entry(content.sha256.clone()).or_insert(0);
        if *refs == 0 {
            self.total_size += content.record.size_bytes;
        }
        *refs += 1;
        self.entries.insert(content.record.key(), content);
    }

    /// Remove an entry; the flag is set when its blob has no references left.
    fn remove(&mut self, key: &CacheKey) -> Option<(StoredContent, bool)> {
        let content = self.entries.remove(key)?;
        let orphaned = match self.blob_refs.get_mut(&content.sha256) {
            Some(refs) if *refs > 1 => {
                *refs -= 1;
                false
            }
            _ => {
                self.blob_refs.remove(&content.sha256);
                self.total_size = self.total_size.saturating_sub(content.record.size_bytes);
                true
            }
        };
        Some((content, orphaned))
    }
}

/// Content cache manager
pub struct ContentCache {
    /// Base path for blob and index storage
    base_path: PathBuf,
    /// Maximum cache size in bytes
    max_size: u64,
    index: RwLock<Index>,
    /// Enable LRU eviction
    lru_enabled: bool,
}

impl ContentCache {
    /// Create a new content cache
    pub fn new(base_path: PathBuf, max_size: u64, lru_enabled: bool) -> Self {
        Self {
            base_path,
            max_size,
            index: RwLock::new(Index::default()),
            lru_enabled,
        }
    }

    /// Create the directory layout and load a previously written index
    pub async fn init(&self) -> HubCacheResult<()> {
        let blobs = self.base_path.join(BLOBS_DIR);
        if !blobs.exists() {
            tokio::fs::create_dir_all(&blobs).await?;
            info!(path = %self.base_path.display(), "Created content cache directory");
        }

        let index_path = self.base_path.join(INDEX_FILE);
        if !index_path.exists() {
            return Ok(());
        }

        let raw = tokio::fs::read(&index_path).await?;
        let stored: Vec<StoredContent> = serde_json::from_slice(&raw)?;

        let mut index = self.index.write().await;
        let mut dropped = 0usize;
        for content in stored {
            if content.path.exists() {
                index.insert(content);
            } else {
                dropped += 1;
            }
        }

        info!(
            entries = index.entries.len(),
            dropped = dropped,
            total_size = index.total_size,
            "Loaded content index"
        );

        Ok(())
    }

    /// Location of the blob with the given digest
    pub fn blob_path(&self, sha256: &str) -> PathBuf {
        self.base_path
            .join(BLOBS_DIR)
            .join(&sha256[..2])
            .join(sha256)
    }

    /// Write a blob through a uniquely named temp file. Writers racing on
    /// the same digest each persist identical bytes, so the last rename wins.
    async fn write_blob(path: &Path, data: &[u8]) -> HubCacheResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| HubCacheError::Storage(format!("no parent for {}", path.display())))?
            .to_path_buf();
        tokio::fs::create_dir_all(&parent).await?;

        let path = path.to_path_buf();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> HubCacheResult<()> {
            let mut tmp = NamedTempFile::new_in(&parent)?;
            tmp.write_all(&data)?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| HubCacheError::Internal(format!("blob writer task failed: {}", e)))?
    }

    async fn persist(&self, index: &Index) -> HubCacheResult<()> {
        let entries: Vec<&StoredContent> = index.entries.values().collect();
        let json = serde_json::to_vec_pretty(&entries)?;

        let path = self.base_path.join(INDEX_FILE);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Remove an entry and return the number of bytes released on disk
    async fn evict(&self, key: &CacheKey) -> HubCacheResult<u64> {
        let mut index = self.index.write().await;
        let Some((content, orphaned)) = index.remove(key) else {
            return Ok(0);
        };

        let mut freed = 0;
        if orphaned {
            if content.path.exists() {
                tokio::fs::remove_file(&content.path).await?;
            }
            freed = content.record.size_bytes;
        }
        self.persist(&index).await?;

        info!(key = %key, freed = freed, "Removed content from cache");
        Ok(freed)
    }

    /// Ensure there's enough space for a new blob
    async fn ensure_space(&self, needed: u64) -> HubCacheResult<()> {
        let (current_size, mut candidates) = {
            let index = self.index.read().await;
            let candidates: Vec<StoredContent> = index.entries.values().cloned().collect();
            (index.total_size, candidates)
        };

        if current_size + needed <= self.max_size {
            return Ok(());
        }

        let to_free = (current_size + needed).saturating_sub(self.max_size);
        candidates.sort_by(|a, b| a.last_accessed.cmp(&b.last_accessed));

        let mut freed = 0u64;
        for content in candidates {
            if freed >= to_free {
                break;
            }
            warn!(key = %content.record, "Evicting content from cache (LRU)");
            freed += self.evict(&content.record.key()).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ContentStore for ContentCache {
    async fn get(&self, key: &CacheKey) -> HubCacheResult<Option<StoredContent>> {
        let mut index = self.index.write().await;
        Ok(index.entries.get_mut(key).map(|content| {
            content.last_accessed = Utc::now();
            content.clone()
        }))
    }

    async fn read(&self, content: &StoredContent) -> HubCacheResult<Vec<u8>> {
        Ok(tokio::fs::read(&content.path).await?)
    }

    async fn put(&self, record: ContentRecord, data: &[u8]) -> HubCacheResult<StoredContent> {
        if record.size_bytes != data.len() as u64 {
            return Err(HubCacheError::Storage(format!(
                "size mismatch for {}: record has {} bytes, blob has {}",
                record,
                record.size_bytes,
                data.len()
            )));
        }

        let key = record.key();
        if let Some(existing) = self.index.read().await.entries.get(&key) {
            return Ok(existing.clone());
        }

        let sha256 = hex::encode(Sha256::digest(data));
        let path = self.blob_path(&sha256);

        let blob_known = self.index.read().await.blob_refs.contains_key(&sha256);
        if !blob_known {
            if self.lru_enabled {
                self.ensure_space(record.size_bytes).await?;
            }
            Self::write_blob(&path, data).await?;
        }

        let mut index = self.index.write().await;
        if let Some(existing) = index.entries.get(&key).cloned() {
            // Lost a race with another writer for the same key.
            if !index.blob_refs.contains_key(&sha256) && path.exists() {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "Failed to remove unused blob");
                }
            }
            return Ok(existing);
        }
        if !path.exists() {
            // Shared blob was evicted between the check and the insert.
            Self::write_blob(&path, data).await?;
        }

        let now = Utc::now();
        let content = StoredContent {
            record,
            sha256,
            path,
            downloaded_at: now,
            last_accessed: now,
        };
        index.insert(content.clone());
        self.persist(&index).await?;

        debug!(
            key = %key,
            sha256 = %content.sha256,
            size = content.record.size_bytes,
            "Added content to cache"
        );

        Ok(content)
    }

    async fn remove(&self, key: &CacheKey) -> HubCacheResult<()> {
        self.evict(key).await.map(|_| ())
    }

    async fn list(&self) -> Vec<ContentRecord> {
        let index = self.index.read().await;
        index.entries.values().map(|c| c.record.clone()).collect()
    }

    async fn stats(&self) -> CacheStats {
        let index = self.index.read().await;

        CacheStats {
            total_size: index.total_size,
            max_size: self.max_size,
            record_count: index.entries.len(),
            blob_count: index.blob_refs.len(),
            utilization: (index.total_size as f64 / self.max_size as f64) * 100.0,
        }
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Bytes on disk
    pub total_size: u64,
    /// Maximum cache size in bytes
    pub max_size: u64,
    /// Number of stored records
    pub record_count: usize,
    /// Number of distinct blobs
    pub blob_count: usize,
    /// Cache utilization percentage
    pub utilization: f64,
}
