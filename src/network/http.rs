//! HTTP network backed by ureq
//!
//! ureq is blocking, so each fetch runs on tokio's blocking pool.

use super::{CacheMode, Network, NetworkError, Request, Response};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// Real HTTP client
#[derive(Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
    user_agent: String,
    max_body_bytes: u64,
}

impl HttpNetwork {
    /// Create a client. Error statuses are returned as responses.
    pub fn new(user_agent: impl Into<String>, max_body_bytes: u64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            user_agent: user_agent.into(),
            max_body_bytes,
        }
    }

    fn fetch_blocking(&self, request: &Request) -> Result<Response, NetworkError> {
        let unreachable = |e: ureq::Error| NetworkError::Unreachable {
            url: request.url.clone(),
            reason: e.to_string(),
        };

        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str())
            .header("User-Agent", self.user_agent.as_str());
        if request.cache == CacheMode::Reload {
            builder = builder
                .header("Cache-Control", "no-cache")
                .header("Pragma", "no-cache");
        }
        let http_request = builder
            .body(())
            .map_err(|e| NetworkError::Unreachable {
                url: request.url.clone(),
                reason: e.to_string(),
            })?;

        let mut response = self.agent.run(http_request).map_err(unreachable)?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| NetworkError::Body {
                url: request.url.clone(),
                reason: e.to_string(),
            })?;

        debug!(url = %request.url, status, bytes = body.len(), "Fetched");
        Ok(Response {
            url: request.url.clone(),
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let this = self.clone();
        let owned = request.clone();
        tokio::task::spawn_blocking(move || this.fetch_blocking(&owned))
            .await
            .map_err(|e| NetworkError::Unreachable {
                url: request.url.clone(),
                reason: format!("fetch task aborted: {}", e),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let network = HttpNetwork::new("shellcache-test", 1024);
        // Port 9 (discard) on loopback is closed on test machines
        let err = network
            .fetch(&Request::get("http://127.0.0.1:9/main.dart.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn malformed_url_is_a_transport_error() {
        let network = HttpNetwork::new("shellcache-test", 1024);
        let err = network.fetch(&Request::get("not a url")).await.unwrap_err();
        assert!(matches!(err, NetworkError::Unreachable { .. }));
    }
}
