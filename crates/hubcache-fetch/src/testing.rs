//! Test fixtures: a local upstream hub and an in-memory fetcher

use async_trait::async_trait;
use axum::{http::header, http::StatusCode, routing::get, Json, Router};
use hubcache_core::{HubCacheError, HubCacheResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::traits::{FetchedBlob, Fetcher};

/// Serve a tiny hub on an ephemeral port and return its base URL
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route(
            "/models/org/repo/resolve/main/config.json",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/json")],
                    r#"{"model_type":"gpt2"}"#,
                )
            }),
        )
        .route(
            "/api/models/microsoft/DialoGPT-medium",
            get(|| async {
                Json(serde_json::json!({
                    "id": "microsoft/DialoGPT-medium",
                    "modelId": "microsoft/DialoGPT-medium",
                    "author": "microsoft",
                }))
            }),
        )
        .route("/broken", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Fetcher answering from a fixed URL table, counting calls
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.responses.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> HubCacheResult<FetchedBlob> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(url)
            .map(|data| FetchedBlob {
                data: data.clone(),
                content_type: None,
            })
            .ok_or_else(|| HubCacheError::UpstreamNotFound(url.to_string()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
