//! REST API handlers

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use hubcache_core::{content_type_for, ContentRecord, HubCacheError, RepoType};
use hubcache_fetch::{HubClient, PullThrough, Served};
use hubcache_store::{CacheStats, ContentStore};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Application state shared across handlers
pub struct AppState {
    pub pull_through: Arc<PullThrough>,
    pub hub_client: Arc<HubClient>,
}

/// Create the API router
pub fn create_router(pull_through: Arc<PullThrough>, hub_client: Arc<HubClient>) -> Router {
    let state = Arc::new(AppState {
        pull_through,
        hub_client,
    });

    Router::new()
        .route("/_cache/status", get(get_status))
        .route("/_cache/records", get(list_records))
        .route("/_cache/repos/:repo_type/*repo_id", get(get_repo_info))
        .fallback(serve_path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(err: HubCacheError) -> (StatusCode, String) {
    let status = match &err {
        HubCacheError::UnsupportedPath(_) | HubCacheError::UpstreamNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        HubCacheError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        HubCacheError::Network(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        warn!(status = %status, error = %err, "Request failed");
    }
    (status, err.to_string())
}

/// Serve any hub path through the pull-through cache
async fn serve_path(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Result<Response, (StatusCode, String)> {
    if method != Method::GET && method != Method::HEAD {
        return Err((
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{} is not supported", method),
        ));
    }

    let target = uri
        .path_and_query()
        .map_or(uri.path(), |pq| pq.as_str())
        .trim_start_matches('/');
    let served = state
        .pull_through
        .serve(target)
        .await
        .map_err(error_response)?;

    let response = match served {
        Served::Content { content, data, hit } => (
            [
                (
                    header::CONTENT_TYPE,
                    content_type_for(&content.record.relative_path).to_string(),
                ),
                (header::ETAG, format!("\"{}\"", content.sha256)),
                (X_CACHE, if hit { "HIT" } else { "MISS" }.to_string()),
            ],
            data,
        )
            .into_response(),
        Served::Metadata(blob) => {
            let content_type = blob
                .content_type
                .unwrap_or_else(|| "application/json".to_string());
            ([(header::CONTENT_TYPE, content_type)], blob.data).into_response()
        }
    };

    Ok(response)
}

/// System status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub hub: String,
    pub store: String,
    pub cache: CacheStats,
}

/// Get cache status
async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let store = state.pull_through.store();

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        hub: state.pull_through.hub().base_url.clone(),
        store: store.name().to_string(),
        cache: store.stats().await,
    }))
}

/// List stored content records
async fn list_records(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContentRecord>>, (StatusCode, String)> {
    let mut records = state.pull_through.store().list().await;
    records.sort_by_key(|r| r.to_string());
    Ok(Json(records))
}

/// Look up repository info on the upstream hub
async fn get_repo_info(
    State(state): State<Arc<AppState>>,
    Path((repo_type, repo_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let repo_type = RepoType::from_plural(&repo_type).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("Unknown repository type: {}", repo_type),
        )
    })?;

    match state
        .hub_client
        .get_repo_info(repo_type, &repo_id)
        .await
        .map_err(error_response)?
    {
        Some(info) => Ok(Json(info)),
        None => Err((
            StatusCode::NOT_FOUND,
            format!("Repository not found: {}/{}", repo_type.plural(), repo_id),
        )),
    }
}
