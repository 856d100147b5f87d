//! Fetch handler
//!
//! Decides per request whether to answer from the content region, go to
//! the network and populate the region, or not intercept at all.

use super::key::{cache_url, request_key, ROOT_KEY};
use super::Agent;
use crate::error::ShellcacheResult;
use crate::network::{Request, Response};
use crate::storage::{CacheRegion, CachedResponse};
use tracing::{debug, warn};

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// Result of the fetch handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller performs a plain network request
    Bypass,
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

impl Agent {
    /// Handle a fetch event
    pub async fn fetch(&self, request: &Request) -> ShellcacheResult<FetchOutcome> {
        if !request.method.is_get() {
            return Ok(FetchOutcome::Bypass);
        }

        let Some(key) = request_key(&request.url, &self.origin) else {
            return Ok(FetchOutcome::Bypass);
        };
        if !self.deployment.manifest().contains(&key) {
            debug!(url = %request.url, %key, "Not in manifest, bypassing");
            return Ok(FetchOutcome::Bypass);
        }

        if key == ROOT_KEY {
            self.online_first(request).await
        } else {
            self.cache_first(request).await
        }
    }

    /// Prefer the live root document; fall back to the cached copy offline
    ///
    /// Storage failures on this path never replace the live response or the
    /// original network error.
    async fn online_first(&self, request: &Request) -> ShellcacheResult<FetchOutcome> {
        let key = cache_url(&request.url, &self.origin);
        match self.network.fetch(request).await {
            Ok(response) => {
                match self.storage.open(&self.regions.content).await {
                    Ok(content) => store_copy(&*content, &key, &response).await,
                    Err(e) => warn!(url = %key, "Failed to open content region: {}", e),
                }
                Ok(FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(network_error) => match self.cached_root(&key).await {
                Some(entry) => {
                    debug!(url = %request.url, "Offline, serving cached root document");
                    Ok(FetchOutcome::Respond {
                        response: entry.response,
                        source: ResponseSource::Cache,
                    })
                }
                None => Err(network_error.into()),
            },
        }
    }

    /// Cached root document; an unreadable region counts as a miss
    async fn cached_root(&self, key: &str) -> Option<CachedResponse> {
        let lookup = async {
            let content = self.storage.open(&self.regions.content).await?;
            content.get(key).await
        };
        match lookup.await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(url = %key, "Failed to read cached root document: {}", e);
                None
            }
        }
    }

    /// Serve from cache; on a miss fetch and keep successful responses
    async fn cache_first(&self, request: &Request) -> ShellcacheResult<FetchOutcome> {
        let content = self.storage.open(&self.regions.content).await?;
        if let Some(entry) = content.get(&request.url).await? {
            return Ok(FetchOutcome::Respond {
                response: entry.response,
                source: ResponseSource::Cache,
            });
        }

        let response = self.network.fetch(request).await?;
        if response.ok() {
            store_copy(&*content, &request.url, &response).await;
        }
        Ok(FetchOutcome::Respond {
            response,
            source: ResponseSource::Network,
        })
    }
}

/// A failed cache write never fails the request that triggered it
async fn store_copy(content: &dyn CacheRegion, url: &str, response: &Response) {
    if let Err(e) = content
        .put(url, CachedResponse::new(response.clone()))
        .await
    {
        warn!(%url, "Failed to cache response: {}", e);
    }
}
