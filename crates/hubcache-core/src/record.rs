//! Cache keys and content records for fetched files

use serde::{Deserialize, Serialize};

use crate::error::{HubCacheError, HubCacheResult};
use crate::path::{PathDescriptor, RepoType};

/// Identity of one cached file across all repos and revisions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub repo_type: RepoType,
    pub repo_id: String,
    pub revision: String,
    pub relative_path: String,
}

impl CacheKey {
    /// Key for a resolve descriptor; any other kind is a caller bug.
    pub fn from_descriptor(descriptor: &PathDescriptor) -> HubCacheResult<Self> {
        if !descriptor.is_resolve() {
            return Err(HubCacheError::NotFetchable {
                path: descriptor.to_string(),
                kind: descriptor.request_kind,
            });
        }

        Ok(Self {
            repo_type: descriptor.repo_type,
            repo_id: descriptor.repo_id.clone(),
            revision: descriptor.revision.clone(),
            relative_path: descriptor.relative_path.clone(),
        })
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}:{}/{}",
            self.repo_type.plural(),
            self.repo_id,
            self.revision,
            self.relative_path
        )
    }
}

/// Persisted description of one successfully fetched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub repo_id: String,
    pub repo_type: RepoType,
    pub revision: String,
    pub relative_path: String,
    pub size_bytes: u64,
}

impl ContentRecord {
    /// Build a record from a parsed resolve path.
    ///
    /// Fails with [`HubCacheError::NotFetchable`] for api or unknown
    /// descriptors.
    pub fn from_fetch(descriptor: &PathDescriptor, size_bytes: u64) -> HubCacheResult<Self> {
        let key = CacheKey::from_descriptor(descriptor)?;
        Ok(Self::from_key(key, size_bytes))
    }

    /// Build a record from a raw relative path, e.g. when only the request
    /// path and the downloaded blob are at hand. Goes through the same
    /// grammar as [`ContentRecord::from_fetch`], so a path without a
    /// repo-type prefix becomes a model record.
    pub fn from_relative_path(path: &str, size_bytes: u64) -> HubCacheResult<Self> {
        Self::from_fetch(&PathDescriptor::parse(path), size_bytes).map_err(|err| match err {
            HubCacheError::NotFetchable { kind, .. } => HubCacheError::NotFetchable {
                path: path.to_string(),
                kind,
            },
            other => other,
        })
    }

    pub fn from_key(key: CacheKey, size_bytes: u64) -> Self {
        Self {
            repo_id: key.repo_id,
            repo_type: key.repo_type,
            revision: key.revision,
            relative_path: key.relative_path,
            size_bytes,
        }
    }

    pub fn key(&self) -> CacheKey {
        CacheKey {
            repo_type: self.repo_type,
            repo_id: self.repo_id.clone(),
            revision: self.revision.clone(),
            relative_path: self.relative_path.clone(),
        }
    }
}

impl std::fmt::Display for ContentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
