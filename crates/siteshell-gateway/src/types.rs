//! Core types for the SiteShell gateway

use file_asset_cache::CacheStats;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Freshness window after which a cached static resource is refetched
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Configuration for the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    /// The one upstream origin the gateway wraps
    pub site_url: String,
    pub cache_dir: PathBuf,
    pub max_age: Duration,
}

/// A resource fetched from the upstream origin
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_age_is_three_days() {
        assert_eq!(DEFAULT_MAX_AGE.as_secs(), 259_200);
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            cache: CacheStats {
                entries: 100,
                total_size: 50_000_000,
                hits: 500,
                misses: 50,
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("ok"));
        assert!(json.contains("3600"));
        assert!(json.contains("500"));
    }
}
