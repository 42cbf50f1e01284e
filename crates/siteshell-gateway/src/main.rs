//! SiteShell Gateway - caching front for a single wrapped website
//!
//! This service proxies every request to one fixed upstream origin and
//! caches static sub-resources (scripts, styles, images, fonts, icons)
//! on disk, so embedded shells pointed at it stay inside the wrapped
//! site and get repeat loads from the local cache.

mod assets;
mod config;
mod error;
mod server;
mod types;
mod upstream;

use crate::error::{GatewayError, Result};
use crate::server::{start_server, ServerState, SharedState};
use crate::types::GatewayConfig;
use crate::upstream::UpstreamFetcher;
use file_asset_cache::AssetCache;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("siteshell_gateway=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting SiteShell Gateway...");

    let config = GatewayConfig::from_env()?;
    info!("Port: {}", config.port);
    info!("Site: {}", config.site_url);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache max age: {} seconds", config.max_age.as_secs());

    // Create cache and fetcher
    let cache = AssetCache::new(config.cache_dir, config.max_age);
    cache.init().await?;

    let fetcher = UpstreamFetcher::new(config.site_url);

    // Create shared state
    let state: SharedState = Arc::new(ServerState::new(
        cache,
        fetcher,
        config.max_age.as_secs(),
    ));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| GatewayError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
