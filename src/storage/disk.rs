//! Filesystem region storage
//!
//! Layout:
//!
//! ```text
//! <root>/<region>/<sha256(key)>.entry
//! ```
//!
//! Each entry file is one line of JSON metadata followed by the raw body.
//! Entries are written to a temp file and renamed into place, so readers
//! never observe a half-written entry.

use super::{CacheRegion, CacheStorage, CachedResponse};
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::network::Response;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

const ENTRY_EXTENSION: &str = "entry";

/// Regions stored as directories under a root
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn region_dir(&self, name: &str) -> PathBuf {
        self.root.join(sanitize_name(name))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> ShellcacheResult<Arc<dyn CacheRegion>> {
        let dir = self.region_dir(name);
        fs::create_dir_all(&dir).await.map_err(|e| {
            ShellcacheError::io(format!("creating region directory {}", dir.display()), e)
        })?;
        Ok(Arc::new(DiskRegion {
            name: name.to_string(),
            dir,
        }))
    }

    async fn delete(&self, name: &str) -> ShellcacheResult<bool> {
        let dir = self.region_dir(name);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).await.map_err(|e| {
            ShellcacheError::io(format!("deleting region directory {}", dir.display()), e)
        })?;
        debug!(region = name, "Deleted region");
        Ok(true)
    }

    async fn has(&self, name: &str) -> ShellcacheResult<bool> {
        Ok(self.region_dir(name).is_dir())
    }

    async fn names(&self) -> ShellcacheResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShellcacheError::io("reading storage root", e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellcacheError::io("reading storage root entry", e))?
        {
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Metadata line of an entry file
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    key: String,
    response: Response,
    stored_at: DateTime<Utc>,
}

/// One region directory
#[derive(Debug)]
pub struct DiskRegion {
    name: String,
    dir: PathBuf,
}

impl DiskRegion {
    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXTENSION))
    }

    fn corrupt(&self, path: &Path, reason: impl std::fmt::Display) -> ShellcacheError {
        ShellcacheError::CorruptEntry {
            region: self.name.clone(),
            reason: format!("{}: {}", path.display(), reason),
        }
    }

    async fn read_entry(&self, path: &Path) -> ShellcacheResult<Option<(EntryMeta, Vec<u8>)>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShellcacheError::io(
                    format!("reading cache entry {}", path.display()),
                    e,
                ))
            }
        };

        let split = bytes
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| self.corrupt(path, "missing metadata line"))?;
        let meta: EntryMeta =
            serde_json::from_slice(&bytes[..split]).map_err(|e| self.corrupt(path, e))?;
        Ok(Some((meta, bytes[split + 1..].to_vec())))
    }

    /// Key recorded in an entry file; `None` if the file is already gone
    async fn read_key(&self, path: &Path) -> ShellcacheResult<Option<String>> {
        let file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ShellcacheError::io(
                    format!("opening cache entry {}", path.display()),
                    e,
                ))
            }
        };
        let mut line = String::new();
        BufReader::new(file)
            .read_line(&mut line)
            .await
            .map_err(|e| ShellcacheError::io(format!("reading cache entry {}", path.display()), e))?;
        let meta: EntryMeta = serde_json::from_str(&line).map_err(|e| self.corrupt(path, e))?;
        Ok(Some(meta.key))
    }
}

#[async_trait]
impl CacheRegion for DiskRegion {
    fn name(&self) -> &str {
        &self.name
    }

    async fn keys(&self) -> ShellcacheResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut keys = vec![];
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| ShellcacheError::io(format!("listing region {}", self.name), e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellcacheError::io(format!("listing region {}", self.name), e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                if let Some(key) = self.read_key(&path).await? {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn get(&self, key: &str) -> ShellcacheResult<Option<CachedResponse>> {
        let path = self.entry_path(key);
        let Some((meta, body)) = self.read_entry(&path).await? else {
            return Ok(None);
        };
        if meta.key != key {
            warn!(region = %self.name, key, stored = %meta.key, "Entry digest collision");
            return Ok(None);
        }

        let mut response = meta.response;
        response.body = body;
        Ok(Some(CachedResponse {
            response,
            stored_at: meta.stored_at,
        }))
    }

    async fn put(&self, key: &str, entry: CachedResponse) -> ShellcacheResult<()> {
        if !self.dir.is_dir() {
            return Err(ShellcacheError::RegionNotFound(self.name.clone()));
        }

        let meta = EntryMeta {
            key: key.to_string(),
            response: entry.response,
            stored_at: entry.stored_at,
        };
        let mut line = serde_json::to_vec(&meta)?;
        line.push(b'\n');

        let path = self.entry_path(key);
        let temp_path = self
            .dir
            .join(format!(".{}.tmp", uuid::Uuid::new_v4()));

        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&line).await?;
            file.write_all(&meta.response.body).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &path).await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ShellcacheError::io(
                format!("writing cache entry {}", path.display()),
                e,
            ));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> ShellcacheResult<bool> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShellcacheError::io(
                format!("deleting cache entry {}", path.display()),
                e,
            )),
        }
    }
}

/// Replace characters that are unsafe in directory names
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn response(url: &str, body: &[u8]) -> CachedResponse {
        CachedResponse::new(
            Response::new(url, 200, body.to_vec()).with_header("Content-Type", "text/javascript"),
        )
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("flutter-app-cache"), "flutter-app-cache");
        assert_eq!(sanitize_name("a/b:c"), "a_b_c");
    }

    #[tokio::test]
    async fn put_and_get_preserve_entry() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let region = storage.open("flutter-app-cache").await.unwrap();

        let url = "https://app.test/main.dart.js";
        let original = response(url, b"line one\nline two\n\x00\xff");
        region.put(url, original.clone()).await.unwrap();

        let loaded = region.get(url).await.unwrap().unwrap();
        assert_eq!(loaded.response, original.response);
        assert_eq!(loaded.stored_at, original.stored_at);
        assert_eq!(region.keys().await.unwrap(), vec![url]);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let region = storage.open("r").await.unwrap();

        assert!(region.get("https://app.test/nope").await.unwrap().is_none());
        assert!(!region.delete("https://app.test/nope").await.unwrap());
    }

    #[tokio::test]
    async fn put_overwrites_and_delete_removes() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let region = storage.open("r").await.unwrap();
        let url = "https://app.test/";

        region.put(url, response(url, b"old")).await.unwrap();
        region.put(url, response(url, b"new")).await.unwrap();
        assert_eq!(region.get(url).await.unwrap().unwrap().response.text(), "new");
        assert_eq!(region.keys().await.unwrap().len(), 1);

        assert!(region.delete(url).await.unwrap());
        assert!(region.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_region_is_not_resurrected() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let region = storage.open("flutter-temp-cache").await.unwrap();

        assert!(storage.delete("flutter-temp-cache").await.unwrap());
        let err = region
            .put("k", response("k", b"v"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShellcacheError::RegionNotFound(_)));
        assert!(!storage.has("flutter-temp-cache").await.unwrap());
    }

    #[tokio::test]
    async fn names_lists_regions() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path().join("regions"));
        assert!(storage.names().await.unwrap().is_empty());

        storage.open("b").await.unwrap();
        storage.open("a").await.unwrap();
        assert_eq!(storage.names().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn corrupt_entry_is_reported() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        storage.open("r").await.unwrap();
        let path = dir.path().join("r").join("bogus.entry");
        tokio::fs::write(&path, b"{not json\nbody").await.unwrap();

        let region = storage.open("r").await.unwrap();
        let err = region.keys().await.unwrap_err();
        assert!(matches!(err, ShellcacheError::CorruptEntry { .. }));
    }

    #[tokio::test]
    async fn vanished_entry_is_skipped() {
        let dir = TempDir::new().unwrap();
        let region = DiskRegion {
            name: "r".to_string(),
            dir: dir.path().to_path_buf(),
        };

        let key = region.read_key(&dir.path().join("gone.entry")).await.unwrap();
        assert!(key.is_none());

        region.put("k", response("k", b"v")).await.unwrap();
        assert_eq!(region.keys().await.unwrap(), vec!["k"]);
    }
}
