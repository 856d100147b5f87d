//! Deployment description: manifest + core shell set

use super::Manifest;
use crate::error::{ShellcacheError, ShellcacheResult};
use serde::Deserialize;
use std::path::Path;

/// Everything the agent knows about the current deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    manifest: Manifest,
    core: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeployment {
    resources: Manifest,
    #[serde(default)]
    core: Vec<String>,
}

impl Deployment {
    /// Build a deployment, checking that the core shell is part of the manifest
    pub fn new(manifest: Manifest, core: Vec<String>) -> ShellcacheResult<Self> {
        if let Some(missing) = core.iter().find(|key| !manifest.contains(key)) {
            return Err(ShellcacheError::CoreNotInManifest(missing.clone()));
        }
        Ok(Self { manifest, core })
    }

    /// Parse a deployment from a JSON file on disk
    pub async fn from_file(path: &Path) -> ShellcacheResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ShellcacheError::io(format!("reading deployment {}", path.display()), e)
        })?;
        Self::parse_at(&content, path)
    }

    /// Parse a deployment from JSON text (for manifests embedded at build time)
    pub fn parse(content: &str) -> ShellcacheResult<Self> {
        Self::parse_at(content, Path::new("<embedded>"))
    }

    fn parse_at(content: &str, path: &Path) -> ShellcacheResult<Self> {
        let raw: RawDeployment =
            serde_json::from_str(content).map_err(|e| ShellcacheError::ManifestInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::new(raw.resources, raw.core)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Resources fetched during install, in declaration order
    pub fn core(&self) -> &[String] {
        &self.core
    }
}
