//! On-demand full population of the content region

use super::key::resource_key;
use super::Agent;
use crate::error::ShellcacheResult;
use crate::network::Request;
use crate::storage::add_all;
use std::collections::HashSet;
use tracing::info;

/// Result of an offline download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Manifest keys that were missing and are now cached
    pub fetched: Vec<String>,
}

impl Agent {
    /// Fetch every manifest resource not yet in the content region.
    ///
    /// One batch: if any resource fails, none of the batch is stored.
    pub async fn download_offline(&self) -> ShellcacheResult<SyncReport> {
        let content = self.storage.open(&self.regions.content).await?;

        let present: HashSet<String> = content
            .keys()
            .await?
            .iter()
            .filter_map(|url| resource_key(url, &self.origin))
            .collect();

        let missing: Vec<String> = self
            .deployment
            .manifest()
            .keys()
            .filter(|key| !present.contains(*key))
            .map(str::to_string)
            .collect();

        let requests: Vec<Request> = missing
            .iter()
            .map(|key| Request::get(self.origin.resolve(key)))
            .collect();
        add_all(&*content, &*self.network, &requests).await?;

        info!(fetched = missing.len(), "Offline download complete");
        Ok(SyncReport { fetched: missing })
    }
}
