//! # Upstream Client
//!
//! HTTP GET ke node cluster dengan decode JSON toleran.
//!
//! ## Perilaku
//!
//! | Method | Base | Cache |
//! |--------|------|-------|
//! | `get` | default | tidak |
//! | `get_text` | default | tidak |
//! | `get_from_base` | eksplisit | write on 2xx, read on 429 |
//! | `get_snapshot` | eksplisit | via `get_from_base` |
//!
//! Body yang kosong atau bukan JSON valid di-decode menjadi `{}`.
//! Status non-2xx menjadi [`UpstreamError::Status`].

use std::sync::Arc;
use std::time::Duration;

use oak_ops_common::text_parse::parse_json_or_empty;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::UpstreamCache;
use crate::config::normalize_base;
use crate::error::UpstreamError;
use crate::metrics::GatewayMetrics;

#[derive(Clone, Debug)]
pub struct UpstreamClient {
    http: Client,
    default_base: String,
    cache: Arc<UpstreamCache>,
    metrics: Arc<GatewayMetrics>,
}

fn join(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

impl UpstreamClient {
    /// Membuat client baru dengan timeout per-request.
    pub fn new(
        default_base: &str,
        timeout: Duration,
        cache: Arc<UpstreamCache>,
        metrics: Arc<GatewayMetrics>,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::ClientBuild)?;

        Ok(Self {
            http,
            default_base: normalize_base(default_base),
            cache,
            metrics,
        })
    }

    pub fn default_base(&self) -> &str {
        &self.default_base
    }

    pub fn cache(&self) -> &Arc<UpstreamCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    /// Issue a GET and return `(status, body)`. Transport failures are errors,
    /// HTTP status is left to the caller.
    async fn fetch(&self, base: &str, path: &str) -> Result<(StatusCode, String), UpstreamError> {
        let url = join(base, path);

        let result = async {
            let response = self
                .http
                .get(&url)
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        }
        .await;

        match result {
            Ok((status, body)) => {
                self.metrics.record_upstream(status.is_success());
                Ok((status, body))
            }
            Err(e) => {
                self.metrics.record_upstream(false);
                warn!(url = %url, error = %e, "upstream request failed");
                Err(UpstreamError::Transport {
                    path: path.to_string(),
                    source: e,
                })
            }
        }
    }

    fn check(path: &str, status: StatusCode) -> Result<(), UpstreamError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            })
        }
    }

    /// GET on the default base with tolerant JSON decode.
    pub async fn get(&self, path: &str) -> Result<Value, UpstreamError> {
        let (status, body) = self.fetch(&self.default_base, path).await?;
        Self::check(path, status)?;
        Ok(parse_json_or_empty(&body))
    }

    /// GET on the default base returning the raw body.
    pub async fn get_text(&self, path: &str) -> Result<String, UpstreamError> {
        let (status, body) = self.fetch(&self.default_base, path).await?;
        Self::check(path, status)?;
        Ok(body)
    }

    /// GET on `base`, with the stale cache standing in for a 429.
    pub async fn get_from_base(&self, path: &str, base: &str) -> Result<Value, UpstreamError> {
        let base = normalize_base(base);
        let (status, body) = self.fetch(&base, path).await?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(data) = self.cache.rescue(&base, &self.default_base, path) {
                self.metrics.stale_cache_hits.inc();
                debug!(base = %base, path = %path, "rate limited, serving cached response");
                return Ok(data);
            }
        }

        Self::check(path, status)?;
        let parsed = parse_json_or_empty(&body);
        self.cache.store(&base, path, parsed.clone());
        Ok(parsed)
    }

    /// Read `primary` and unwrap its object-typed `data`; otherwise return
    /// the `fallback` payload as-is.
    pub async fn get_snapshot(
        &self,
        primary: &str,
        fallback: &str,
        base: &str,
    ) -> Result<Value, UpstreamError> {
        match self.get_from_base(primary, base).await {
            Ok(Value::Object(mut envelope)) => match envelope.remove("data") {
                Some(data @ Value::Object(_)) => return Ok(data),
                _ => debug!(path = %primary, "snapshot has no data object, using fallback"),
            },
            Ok(_) => debug!(path = %primary, "snapshot is not an object, using fallback"),
            Err(e) => debug!(path = %primary, error = %e, "snapshot unavailable, using fallback"),
        }

        self.metrics.snapshot_fallbacks.inc();
        self.get_from_base(fallback, base).await
    }

    /// [`get_snapshot`](Self::get_snapshot) on a `(primary, fallback)` pair.
    pub async fn get_snapshot_pair(
        &self,
        (primary, fallback): (&str, &str),
        base: &str,
    ) -> Result<Value, UpstreamError> {
        self.get_snapshot(primary, fallback, base).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_single_slash() {
        assert_eq!(join("http://h:1", "/a/b"), "http://h:1/a/b");
        assert_eq!(join("http://h:1", "a/b"), "http://h:1/a/b");
    }

    #[test]
    fn test_new_normalizes_base() {
        let client = UpstreamClient::new(
            "http://127.0.0.1:8090/",
            Duration::from_millis(100),
            Arc::new(UpstreamCache::default()),
            Arc::new(GatewayMetrics::new()),
        )
        .unwrap();
        assert_eq!(client.default_base(), "http://127.0.0.1:8090");
    }
}
