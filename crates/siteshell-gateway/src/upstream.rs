//! Fetching from the wrapped upstream origin

use crate::error::Result;
use crate::types::FetchedResource;
use reqwest::Client;
use tracing::debug;

/// HTTP client bound to the single origin the gateway wraps
pub struct UpstreamFetcher {
    client: Client,
    site_url: String,
}

impl UpstreamFetcher {
    /// Create a fetcher for the given origin. The origin is expected to be
    /// validated already (absolute http(s), no trailing slash).
    pub fn new(site_url: String) -> Self {
        Self {
            client: Client::new(),
            site_url,
        }
    }

    /// Resolve a request path against the wrapped origin. Every path maps
    /// into the one configured site, so navigation cannot leave it.
    pub fn resolve(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.site_url, path_and_query)
        } else {
            format!("{}/{}", self.site_url, path_and_query)
        }
    }

    /// GET a resource from the upstream origin.
    pub async fn fetch(&self, path_and_query: &str) -> Result<FetchedResource> {
        let url = self.resolve(path_and_query);
        debug!(url = %url, "Fetching from upstream");

        let response = self.client.get(&url).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response.bytes().await?.to_vec();

        debug!(url = %url, status, size = body.len(), "Fetched from upstream");

        Ok(FetchedResource {
            status,
            content_type,
            body,
        })
    }

    /// Relay a non-GET request (method and body) to the upstream origin.
    pub async fn relay(
        &self,
        method: reqwest::Method,
        path_and_query: &str,
        body: Vec<u8>,
    ) -> Result<FetchedResource> {
        let url = self.resolve(path_and_query);
        debug!(method = %method, url = %url, "Relaying to upstream");

        let response = self.client.request(method, &url).body(body).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response.bytes().await?.to_vec();

        Ok(FetchedResource {
            status,
            content_type,
            body,
        })
    }
}
