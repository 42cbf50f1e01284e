//! HTTP server for the gateway
//!
//! Provides /health plus a fallback route that intercepts every other
//! request: static sub-resources are served from the asset cache when
//! fresh and fetched-and-stored otherwise; everything else is passed
//! through to the wrapped origin untouched.

use crate::assets::{is_static_resource, mime_type};
use crate::types::HealthResponse;
use crate::upstream::UpstreamFetcher;
use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use file_asset_cache::AssetCache;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: AssetCache,
    pub fetcher: UpstreamFetcher,
    pub max_age_secs: u64,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: AssetCache, fetcher: UpstreamFetcher, max_age_secs: u64) -> Self {
        Self {
            cache,
            fetcher,
            max_age_secs,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(intercept)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// Fallback handler: every request that is not /health goes to the
/// wrapped origin, with cacheable static resources intercepted.
async fn intercept(
    State(state): State<SharedState>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    body: Bytes,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    if method != Method::GET {
        return relay_request(&state, method, &path_and_query, body.to_vec()).await;
    }

    if is_static_resource(&path_and_query) {
        serve_static(&state, &path_and_query).await
    } else {
        pass_through(&state, &path_and_query).await
    }
}

/// Serve a static resource: cache when fresh, otherwise fetch and store.
async fn serve_static(state: &SharedState, path_and_query: &str) -> Response {
    let url = state.fetcher.resolve(path_and_query);

    if let Some(data) = state.cache.get(&url).await {
        return static_response(state, path_and_query, data, true);
    }

    match state.fetcher.fetch(path_and_query).await {
        Ok(resource) => {
            let status = StatusCode::from_u16(resource.status).unwrap_or(StatusCode::BAD_GATEWAY);
            if !status.is_success() {
                // Upstream errors are relayed, never cached.
                return upstream_response(status, resource.content_type, resource.body);
            }

            // Store asynchronously; the response does not wait on the disk.
            let store_state = state.clone();
            let data = resource.body.clone();
            tokio::spawn(async move {
                if let Err(e) = store_state.cache.put(&url, &data).await {
                    warn!(url = %url, error = %e, "Failed to cache resource");
                }
            });

            static_response(state, path_and_query, resource.body, false)
        }
        Err(e) => {
            warn!(path = %path_and_query, error = %e, "Failed to fetch static resource");
            bad_gateway()
        }
    }
}

/// Pass a non-static GET through to the origin with no cache involvement.
async fn pass_through(state: &SharedState, path_and_query: &str) -> Response {
    match state.fetcher.fetch(path_and_query).await {
        Ok(resource) => {
            let status = StatusCode::from_u16(resource.status).unwrap_or(StatusCode::BAD_GATEWAY);
            upstream_response(status, resource.content_type, resource.body)
        }
        Err(e) => {
            warn!(path = %path_and_query, error = %e, "Failed to pass request through");
            bad_gateway()
        }
    }
}

/// Relay a non-GET request (method and body) to the origin.
async fn relay_request(
    state: &SharedState,
    method: Method,
    path_and_query: &str,
    body: Vec<u8>,
) -> Response {
    let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
        .unwrap_or(reqwest::Method::GET);

    match state.fetcher.relay(method, path_and_query, body).await {
        Ok(resource) => {
            let status = StatusCode::from_u16(resource.status).unwrap_or(StatusCode::BAD_GATEWAY);
            upstream_response(status, resource.content_type, resource.body)
        }
        Err(e) => {
            warn!(path = %path_and_query, error = %e, "Failed to relay request");
            bad_gateway()
        }
    }
}

/// Shape a cached-or-fetched static resource response. The MIME type is
/// derived from the extension, matching the classification that routed the
/// request here.
fn static_response(
    state: &SharedState,
    path_and_query: &str,
    data: Vec<u8>,
    from_cache: bool,
) -> Response {
    let cache_header = if from_cache { "HIT" } else { "MISS" };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type(path_and_query))
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.max_age_secs),
        )
        .header("X-Cache", cache_header)
        .body(Body::from(data))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Relay an upstream response as-is.
fn upstream_response(status: StatusCode, content_type: Option<String>, body: Vec<u8>) -> Response {
    Response::builder()
        .status(status)
        .header(
            header::CONTENT_TYPE,
            content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        )
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: "Upstream unavailable".to_string(),
        }),
    )
        .into_response()
}
