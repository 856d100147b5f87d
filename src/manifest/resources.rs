//! Resource manifest: logical path -> fingerprint

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping of origin-relative resource path to an opaque fingerprint.
///
/// `/` is the root document. Identical fingerprints mean identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    resources: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new(resources: BTreeMap<String, String>) -> Self {
        Self { resources }
    }

    /// Fingerprint recorded for `key`
    pub fn fingerprint(&self, key: &str) -> Option<&str> {
        self.resources.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// True when a cached copy of `key` made under `previous` can be reused
    pub fn is_unchanged_since(&self, previous: &Manifest, key: &str) -> bool {
        match (self.fingerprint(key), previous.fingerprint(key)) {
            (Some(current), Some(old)) => current == old,
            _ => false,
        }
    }

    /// Serialized form persisted in the manifest region
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Compare against the manifest of a previous deployment
    pub fn diff(&self, previous: &Manifest) -> ManifestDiff {
        let mut diff = ManifestDiff::default();
        for (key, fingerprint) in &self.resources {
            match previous.fingerprint(key) {
                None => diff.added.push(key.clone()),
                Some(old) if old != fingerprint => diff.changed.push(key.clone()),
                Some(_) => diff.unchanged += 1,
            }
        }
        diff.removed = previous
            .keys()
            .filter(|key| !self.contains(key))
            .map(str::to_string)
            .collect();
        diff
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            resources: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Key-level difference between two manifests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}
