//! Install and activate handlers
//!
//! Install downloads the core shell into the temp region. Activate merges
//! it into the content region, evicting every entry whose fingerprint is
//! not provably current, and records the manifest for the next upgrade.
//! Any failure during activate deletes all three regions: an empty cache
//! is recoverable, a half-reconciled one is not.

use super::key::resource_key;
use super::Agent;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::manifest::{Manifest, ManifestDiff};
use crate::network::{Request, Response};
use crate::storage::{add_all, copy_all, CacheRegion, CachedResponse};
use tracing::{debug, error, info};

/// Fixed key of the persisted manifest inside the manifest region
pub const MANIFEST_KEY: &str = "manifest";

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Core shell responses stored in the temp region
    pub cached: usize,
}

/// What a successful activation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// No previous manifest existed; the content region was rebuilt
    pub fresh: bool,
    /// Content keys kept from the previous deployment
    pub retained: Vec<String>,
    /// Content keys removed as stale or no longer listed
    pub evicted: Vec<String>,
    /// Shell entries copied from the temp region
    pub shell_copied: usize,
}

/// Result of the activate handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated(ActivationReport),
    /// Reconciliation failed and every region was deleted
    Reset { reason: String },
}

impl Agent {
    /// Handle the install event.
    ///
    /// Fetches every core shell resource bypassing HTTP caches. The batch
    /// is all-or-nothing; on error the runtime discards this agent version.
    pub async fn install(&self) -> ShellcacheResult<InstallReport> {
        self.host.skip_waiting().await;

        // Leftovers from an install that never activated must not be merged
        if self.storage.delete(&self.regions.temp).await? {
            debug!(region = %self.regions.temp, "Cleared stale temp region");
        }
        let temp = self.storage.open(&self.regions.temp).await?;

        let requests: Vec<Request> = self
            .deployment
            .core()
            .iter()
            .map(|key| Request::get(self.origin.resolve(key)).reload())
            .collect();

        match add_all(&*temp, &*self.network, &requests).await {
            Ok(cached) => {
                info!(cached, "Installed core shell");
                Ok(InstallReport { cached })
            }
            Err(e) => {
                error!("Install failed: {}", e);
                Err(e)
            }
        }
    }

    /// Handle the activate event.
    ///
    /// Only errors from the fail-to-empty recovery itself are returned;
    /// reconciliation errors produce `ActivationOutcome::Reset`. Recovery
    /// attempts every region and reports the first deletion error.
    pub async fn activate(&self) -> ShellcacheResult<ActivationOutcome> {
        match self.reconcile().await {
            Ok(report) => {
                info!(
                    fresh = report.fresh,
                    retained = report.retained.len(),
                    evicted = report.evicted.len(),
                    shell = report.shell_copied,
                    "Activated"
                );
                self.host.claim_clients().await;
                Ok(ActivationOutcome::Activated(report))
            }
            Err(e) => {
                error!("Failed to upgrade agent: {}", e);
                let mut first_error = None;
                for name in self.regions.all() {
                    if let Err(delete_error) = self.storage.delete(name).await {
                        error!(region = name, "Failed to delete region: {}", delete_error);
                        first_error.get_or_insert(delete_error);
                    }
                }
                match first_error {
                    Some(delete_error) => Err(delete_error),
                    None => Ok(ActivationOutcome::Reset {
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Difference between the persisted manifest and this deployment's.
    ///
    /// `None` when no manifest has been persisted yet. Never creates regions.
    pub async fn pending_changes(&self) -> ShellcacheResult<Option<ManifestDiff>> {
        if !self.storage.has(&self.regions.manifest).await? {
            return Ok(None);
        }
        let manifest_region = self.storage.open(&self.regions.manifest).await?;
        let previous = self.previous_manifest(&*manifest_region).await?;
        Ok(previous.map(|previous| self.deployment.manifest().diff(&previous)))
    }

    async fn reconcile(&self) -> ShellcacheResult<ActivationReport> {
        let mut content = self.storage.open(&self.regions.content).await?;
        let temp = self.storage.open(&self.regions.temp).await?;
        let manifest_region = self.storage.open(&self.regions.manifest).await?;

        let mut report = ActivationReport::default();
        match self.previous_manifest(&*manifest_region).await? {
            None => {
                // Anything already here was written by an agent that kept no
                // manifest, so none of it can be trusted.
                self.storage.delete(&self.regions.content).await?;
                content = self.storage.open(&self.regions.content).await?;
                report.fresh = true;
            }
            Some(previous) => {
                self.evict_stale(&*content, &previous, &mut report).await?;
            }
        }

        report.shell_copied = copy_all(&*temp, &*content).await?;
        self.storage.delete(&self.regions.temp).await?;

        let manifest = self.deployment.manifest();
        let record = Response::new(MANIFEST_KEY, 200, manifest.to_json()?)
            .with_header("Content-Type", "application/json");
        manifest_region
            .put(MANIFEST_KEY, CachedResponse::new(record))
            .await?;

        Ok(report)
    }

    async fn previous_manifest(
        &self,
        manifest_region: &dyn CacheRegion,
    ) -> ShellcacheResult<Option<Manifest>> {
        let Some(entry) = manifest_region.get(MANIFEST_KEY).await? else {
            return Ok(None);
        };
        let manifest = Manifest::from_json(&entry.response.body).map_err(|e| {
            ShellcacheError::CorruptEntry {
                region: self.regions.manifest.clone(),
                reason: format!("persisted manifest: {}", e),
            }
        })?;
        Ok(Some(manifest))
    }

    /// Keep only entries whose fingerprint is identical in both manifests.
    ///
    /// The old manifest is what describes the cached bytes; a lazily fetched
    /// entry was fetched under the old fingerprint.
    async fn evict_stale(
        &self,
        content: &dyn CacheRegion,
        previous: &Manifest,
        report: &mut ActivationReport,
    ) -> ShellcacheResult<()> {
        let current = self.deployment.manifest();
        for url in content.keys().await? {
            let keep = resource_key(&url, &self.origin)
                .is_some_and(|key| current.is_unchanged_since(previous, &key));
            if keep {
                report.retained.push(url);
            } else {
                content.delete(&url).await?;
                report.evicted.push(url);
            }
        }
        Ok(())
    }
}
