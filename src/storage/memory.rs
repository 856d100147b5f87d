//! In-process region storage

use super::{CacheRegion, CacheStorage, CachedResponse};
use crate::error::ShellcacheResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Regions held in memory. Deleting a region detaches it: handles that
/// are still open keep working but are no longer reachable by name.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    regions: Mutex<HashMap<String, Arc<MemoryRegion>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<MemoryRegion>>> {
        self.regions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> ShellcacheResult<Arc<dyn CacheRegion>> {
        let region: Arc<dyn CacheRegion> = self
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryRegion::new(name)))
            .clone();
        Ok(region)
    }

    async fn delete(&self, name: &str) -> ShellcacheResult<bool> {
        Ok(self.lock().remove(name).is_some())
    }

    async fn has(&self, name: &str) -> ShellcacheResult<bool> {
        Ok(self.lock().contains_key(name))
    }

    async fn names(&self) -> ShellcacheResult<Vec<String>> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// One in-memory region
#[derive(Debug)]
pub struct MemoryRegion {
    name: String,
    entries: Mutex<BTreeMap<String, CachedResponse>>,
}

impl MemoryRegion {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, CachedResponse>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheRegion for MemoryRegion {
    fn name(&self) -> &str {
        &self.name
    }

    async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }

    async fn get(&self, key: &str) -> ShellcacheResult<Option<CachedResponse>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, entry: CachedResponse) -> ShellcacheResult<()> {
        self.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ShellcacheResult<bool> {
        Ok(self.lock().remove(key).is_some())
    }
}
