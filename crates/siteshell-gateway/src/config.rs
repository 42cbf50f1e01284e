//! Gateway configuration parsed from environment variables

use crate::error::{GatewayError, Result};
use crate::types::{GatewayConfig, DEFAULT_MAX_AGE};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

impl GatewayConfig {
    /// Parse configuration from environment variables. `SITE_URL` is
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let site_url = env::var("SITE_URL")
            .map_err(|_| GatewayError::Config("SITE_URL is required".to_string()))?;
        let site_url = validate_site_url(&site_url)?;

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3080);

        let cache_dir = env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./cache/assets"));

        let max_age = env::var("CACHE_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_MAX_AGE);

        Ok(Self {
            port,
            site_url,
            cache_dir,
            max_age,
        })
    }
}

/// Require an absolute http(s) origin and strip any trailing slash so
/// request paths can be appended directly.
pub fn validate_site_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| GatewayError::Config(format!("Invalid SITE_URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(GatewayError::Config(format!(
            "SITE_URL must be http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
