//! HTTP-backed JSON source.
//!
//! Fetches route documents over HTTP with:
//! - Connection pooling and request timeouts
//! - Automatic retry with exponential backoff on 429 and transport errors
//!
//! Wrap it in a [`CachedSource`](crate::CachedSource) to fetch each URL once.

use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Result, RouteDataError};
use crate::source::JsonSource;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// [`JsonSource`] that performs HTTP GET requests.
#[derive(Debug, Clone)]
pub struct HttpJsonSource {
    client: Client,
    base_url: Option<String>,
}

impl HttpJsonSource {
    /// Create a source with a pooled client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RouteDataError::Request {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Resolve relative document URLs against `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.contains("://") => {
                format!("{}/{}", base, url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<Value> {
        let mut retries = 0;
        let req_start = Instant::now();

        loop {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        retries += 1;
                        if retries > MAX_RETRIES {
                            return Err(RouteDataError::Status {
                                url: url.to_string(),
                                status: status.as_u16(),
                            });
                        }

                        // Exponential backoff: 1s, 2s, 4s
                        let wait = Duration::from_millis(500 * (1 << retries));
                        warn!(
                            "[HttpJsonSource] 429 for {}, retry {} with {:?} backoff",
                            url, retries, wait
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(RouteDataError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    let bytes = resp.bytes().await.map_err(|e| RouteDataError::Request {
                        url: url.to_string(),
                        message: format!("Body download error: {}", e),
                    })?;

                    let value: Value =
                        serde_json::from_slice(&bytes).map_err(|source| RouteDataError::Json {
                            url: url.to_string(),
                            source,
                        })?;

                    debug!(
                        "[HttpJsonSource] {} ({:.1}KB) in {:?}",
                        url,
                        bytes.len() as f64 / 1024.0,
                        req_start.elapsed()
                    );

                    return Ok(value);
                }
                Err(e) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(RouteDataError::Request {
                            url: url.to_string(),
                            message: e.to_string(),
                        });
                    }

                    let wait = Duration::from_millis(200 * (1 << retries));
                    warn!(
                        "[HttpJsonSource] Error for {}: {}, retry {} after {:?}",
                        url, e, retries, wait
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

impl JsonSource for HttpJsonSource {
    async fn fetch_json(&self, url: &str) -> Result<Arc<Value>> {
        let url = self.resolve(url);
        info!("[HttpJsonSource] GET {}", url);
        self.fetch_with_retry(&url).await.map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_urls() {
        let source = HttpJsonSource::new()
            .unwrap()
            .with_base_url("https://example.org/data/");

        assert_eq!(source.resolve("routes.json"), "https://example.org/data/routes.json");
        assert_eq!(source.resolve("/pois.json"), "https://example.org/data/pois.json");
        assert_eq!(
            source.resolve("https://cdn.example.org/r1.json"),
            "https://cdn.example.org/r1.json"
        );
    }

    #[test]
    fn test_no_base_url_passes_through() {
        let source = HttpJsonSource::new().unwrap();
        assert_eq!(source.resolve("routes.json"), "routes.json");
    }
}
