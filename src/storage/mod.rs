//! Persistent cache regions
//!
//! A region is a named key -> response store. Keys are absolute request
//! URLs, except in the manifest region which uses the fixed key
//! `manifest`. Each key operation is atomic and last-writer-wins; there is
//! no cross-key transaction.
//!
//! # Regions
//!
//! | Region | Lifetime |
//! |--------|----------|
//! | temp | created at install, deleted after activation merges it |
//! | content | survives activations, the serving cache |
//! | manifest | one entry: the manifest of the last successful activation |

mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::network::{Network, Request, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A stored response with the time it entered the region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub response: Response,
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
        }
    }
}

/// A named key -> response store
#[async_trait]
pub trait CacheRegion: Send + Sync {
    /// Region name
    fn name(&self) -> &str;

    /// All keys currently stored
    async fn keys(&self) -> ShellcacheResult<Vec<String>>;

    /// Look up an entry
    async fn get(&self, key: &str) -> ShellcacheResult<Option<CachedResponse>>;

    /// Insert or overwrite an entry
    async fn put(&self, key: &str, entry: CachedResponse) -> ShellcacheResult<()>;

    /// Remove an entry, returning whether it existed
    async fn delete(&self, key: &str) -> ShellcacheResult<bool>;
}

/// The set of regions owned by one agent
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a region, creating it empty if absent
    async fn open(&self, name: &str) -> ShellcacheResult<Arc<dyn CacheRegion>>;

    /// Delete a region and all its entries, returning whether it existed
    async fn delete(&self, name: &str) -> ShellcacheResult<bool>;

    /// Whether a region exists
    async fn has(&self, name: &str) -> ShellcacheResult<bool>;

    /// Names of all existing regions
    async fn names(&self) -> ShellcacheResult<Vec<String>>;
}

/// Stable names of the three regions.
///
/// Names must not change between agent versions or upgrades lose the
/// persisted manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionNames {
    pub temp: String,
    pub content: String,
    pub manifest: String,
}

impl Default for RegionNames {
    fn default() -> Self {
        Self {
            temp: "flutter-temp-cache".to_string(),
            content: "flutter-app-cache".to_string(),
            manifest: "flutter-app-manifest".to_string(),
        }
    }
}

impl RegionNames {
    pub fn all(&self) -> [&str; 3] {
        [&self.content, &self.temp, &self.manifest]
    }
}

/// Copy every entry of `from` into `to`, overwriting same-key entries
pub async fn copy_all(from: &dyn CacheRegion, to: &dyn CacheRegion) -> ShellcacheResult<usize> {
    let keys = from.keys().await?;
    let mut copied = 0;
    for key in keys {
        if let Some(entry) = from.get(&key).await? {
            to.put(&key, entry).await?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Fetch a batch and store every response, or store nothing.
///
/// The batch fails if any fetch fails or returns a non-success status.
/// Responses are written only after the whole batch has arrived.
pub async fn add_all(
    region: &dyn CacheRegion,
    network: &dyn Network,
    requests: &[Request],
) -> ShellcacheResult<usize> {
    let responses = try_join_all(requests.iter().map(|request| async move {
        let response = network.fetch(request).await?;
        if !response.ok() {
            return Err(ShellcacheError::BadStatus {
                url: request.url.clone(),
                status: response.status,
            });
        }
        Ok::<_, ShellcacheError>((request.url.as_str(), response))
    }))
    .await?;

    for (key, response) in &responses {
        region.put(key, CachedResponse::new(response.clone())).await?;
    }

    debug!(
        region = region.name(),
        count = responses.len(),
        "Stored batch"
    );
    Ok(responses.len())
}
