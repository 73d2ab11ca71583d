//! Configuration types for hubcache

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::remote::RemoteHubDescriptor;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Upstream hub
    pub hub: HubConfig,
    /// API server configuration
    pub api: ApiConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::HubCacheError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::HubCacheError::Config(format!("Failed to read config file: {}", e))
        })?;
        toml::from_str(&content)
            .map_err(|e| crate::HubCacheError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Upstream hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Base URL of the hub
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HubConfig {
    pub fn descriptor(&self) -> RemoteHubDescriptor {
        RemoteHubDescriptor::new(self.base_url.clone())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://huggingface.co".to_string(),
            timeout_secs: 300,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the server
    pub address: String,
    /// Port for the server
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding cached blobs
    pub cache_path: PathBuf,
    /// Maximum cache size in bytes
    pub max_cache_size: u64,
    /// Enable LRU eviction
    pub lru_eviction: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("/var/lib/hubcache"),
            max_cache_size: 100 * 1024 * 1024 * 1024, // 100 GB
            lru_eviction: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
