//! hubcache daemon
//!
//! Pull-through cache server for a model hub.

use anyhow::Context;
use clap::Parser;
use hubcache_api::create_router;
use hubcache_core::DaemonConfig;
use hubcache_fetch::{HttpFetcher, HubClient, PullThrough};
use hubcache_store::ContentCache;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// hubcached - pull-through cache for model hub content
#[derive(Parser, Debug)]
#[command(name = "hubcached")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind the server
    #[arg(long)]
    address: Option<String>,

    /// Port for the server
    #[arg(long)]
    port: Option<u16>,

    /// Upstream hub base URL
    #[arg(long)]
    hub_url: Option<String>,

    /// Directory for cached content
    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Load the config file (or defaults) and apply command-line overrides
    fn into_config(self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_file(path)?,
            None => DaemonConfig::default(),
        };

        if let Some(address) = self.address {
            config.api.address = address;
        }
        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(hub_url) = self.hub_url {
            config.hub.base_url = hub_url;
        }
        if let Some(cache_path) = self.cache_path {
            config.storage.cache_path = cache_path;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }

        Ok(config)
    }
}

fn log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&config.logging.level))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting hubcache daemon v{}", env!("CARGO_PKG_VERSION"));

    let cache = ContentCache::new(
        config.storage.cache_path.clone(),
        config.storage.max_cache_size,
        config.storage.lru_eviction,
    );
    cache.init().await?;

    let fetcher = HttpFetcher::new(config.hub.timeout_secs)?;
    let pull_through = Arc::new(PullThrough::new(
        config.hub.descriptor(),
        Arc::new(fetcher),
        Arc::new(cache),
    ));

    let hub_client = Arc::new(HubClient::new(
        config.hub.descriptor(),
        config.hub.timeout_secs,
    )?);

    let router = create_router(pull_through, hub_client);

    let addr: SocketAddr = format!("{}:{}", config.api.address, config.api.port)
        .parse()
        .context("Invalid listen address")?;

    info!("Serving on {}", addr);
    info!("Upstream hub at {}", config.hub.base_url);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}
