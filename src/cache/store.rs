//! Cache storage implementation.
//!
//! Layout: one directory per named cache under the root. Each entry is a
//! metadata file named by the hash of its request key, `<hash>.meta.json`,
//! plus a body file unique to the write that produced it,
//! `<hash>.<body id>.body`. A write lands its body first, then renames its
//! metadata into place; that rename is the commit, so the last write wins
//! and a reader never pairs one response's metadata with another's body.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::entry::CacheEntry;
use crate::worker::FetchResponse;

const BODY_EXTENSION: &str = "body";
const META_EXTENSION: &str = "meta.json";

static WRITE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Named caches of request/response pairs, persisted on disk.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Root directory holding one subdirectory per cache.
    root: PathBuf,
    /// Serializes commits made through clones of this store.
    writes: Arc<Mutex<()>>,
}

impl CacheStore {
    /// Create a new cache store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a named cache. Rejects names that could leave the root.
    fn cache_dir(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !valid {
            bail!("Invalid cache name {:?}", name);
        }

        Ok(self.root.join(name))
    }

    /// Path stem shared by an entry's body and metadata files.
    fn entry_stem(&self, name: &str, key: &str) -> Result<PathBuf> {
        let hash = Sha256::digest(key.as_bytes());
        Ok(self.cache_dir(name)?.join(hex::encode(&hash[..16])))
    }

    fn body_file(stem: &Path, body_id: &str) -> Result<PathBuf> {
        if body_id.is_empty() || !body_id.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid body id {:?}", body_id);
        }
        Ok(stem.with_extension(format!("{}.{}", body_id, BODY_EXTENSION)))
    }

    /// Where the body of a stored entry lives.
    pub fn body_path(&self, entry: &CacheEntry) -> Result<PathBuf> {
        let stem = self.entry_stem(&entry.cache_name, &entry.url)?;
        Self::body_file(&stem, &entry.body_id)
    }

    fn metadata_path(stem: &Path) -> PathBuf {
        stem.with_extension(META_EXTENSION)
    }

    /// Create a cache if it doesn't exist yet.
    pub async fn open(&self, name: &str) -> Result<()> {
        let dir = self.cache_dir(name)?;
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create cache directory {:?}", dir))
    }

    /// Whether a cache exists.
    pub async fn has(&self, name: &str) -> bool {
        match self.cache_dir(name) {
            Ok(dir) => fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()),
            Err(_) => false,
        }
    }

    /// Names of all caches, sorted.
    pub async fn names(&self) -> Result<Vec<String>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list caches in {:?}", self.root))
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Delete a cache and everything in it. Returns whether it existed.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.cache_dir(name)?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted cache {}", name);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete cache {:?}", dir)),
        }
    }

    /// Store a response under a request key, replacing any previous entry.
    pub async fn put(&self, name: &str, key: &str, response: &FetchResponse) -> Result<CacheEntry> {
        self.open(name).await?;

        let stem = self.entry_stem(name, key)?;
        let body_id = unique_id();
        let body_path = Self::body_file(&stem, &body_id)?;
        fs::write(&body_path, &response.body)
            .await
            .with_context(|| format!("Failed to write {:?}", body_path))?;

        let entry = CacheEntry::new(name, key, response, body_id.as_str());
        let json = serde_json::to_vec_pretty(&entry)?;
        let staged = stem.with_extension(format!("{}.meta.tmp", body_id));
        fs::write(&staged, &json)
            .await
            .with_context(|| format!("Failed to write {:?}", staged))?;

        let _guard = self.writes.lock().await;
        let replaced = self.read_entry(&stem, key).await.ok().flatten();

        let meta_path = Self::metadata_path(&stem);
        if let Err(e) = fs::rename(&staged, &meta_path).await {
            let _ = fs::remove_file(&staged).await;
            let _ = fs::remove_file(&body_path).await;
            return Err(e).with_context(|| format!("Failed to move {:?} into place", meta_path));
        }

        if let Some(old) = replaced.filter(|old| old.body_id != entry.body_id) {
            if let Ok(old_body) = Self::body_file(&stem, &old.body_id) {
                remove_if_present(&old_body).await?;
            }
        }

        Ok(entry)
    }

    async fn read_entry(&self, stem: &Path, key: &str) -> Result<Option<CacheEntry>> {
        let json = match fs::read(Self::metadata_path(stem)).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read cache metadata"),
        };
        let entry = serde_json::from_slice(&json)
            .with_context(|| format!("Corrupt cache metadata for {}", key))?;
        Ok(Some(entry))
    }

    /// Look up a request key in one cache.
    pub async fn lookup(&self, name: &str, key: &str) -> Result<Option<FetchResponse>> {
        let stem = self.entry_stem(name, key)?;

        let Some(entry) = self.read_entry(&stem, key).await? else {
            return Ok(None);
        };
        let body_path = Self::body_file(&stem, &entry.body_id)?;

        match fs::read(&body_path).await {
            Ok(body) => Ok(Some(entry.into_response(body))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Cache {} lists {} but its body is missing", name, key);
                Ok(None)
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read cached body from {:?}", body_path))
            }
        }
    }

    /// Remove one entry. Returns whether anything was removed.
    pub async fn remove(&self, name: &str, key: &str) -> Result<bool> {
        let stem = self.entry_stem(name, key)?;
        let prefix = match stem.file_name().and_then(|n| n.to_str()) {
            Some(hash) => format!("{}.", hash),
            None => return Ok(false),
        };

        let _guard = self.writes.lock().await;
        let mut dir = match fs::read_dir(self.cache_dir(name)?).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let mut removed = false;
        while let Some(item) = dir.next_entry().await? {
            let matches = item
                .file_name()
                .to_str()
                .is_some_and(|n| {
                    n.starts_with(&prefix)
                        && (n.ends_with(META_EXTENSION) || n.ends_with(BODY_EXTENSION))
                });
            if matches && remove_if_present(&item.path()).await? {
                removed = true;
            }
        }

        Ok(removed)
    }

    /// All entries in a cache, newest first. Unreadable metadata is skipped.
    pub async fn entries(&self, name: &str) -> Result<Vec<CacheEntry>> {
        let dir_path = self.cache_dir(name)?;
        let mut dir = match fs::read_dir(&dir_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            let is_meta = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(META_EXTENSION));
            if !is_meta {
                continue;
            }

            if let Ok(json) = fs::read(&path).await {
                if let Ok(entry) = serde_json::from_slice::<CacheEntry>(&json) {
                    entries.push(entry);
                }
            }
        }

        entries.sort_by(|a, b| b.metadata.cached_at.cmp(&a.metadata.cached_at));
        Ok(entries)
    }

    /// Get total size of all cached bodies in bytes.
    pub async fn total_size(&self) -> Result<u64> {
        let mut total = 0;
        for name in self.names().await? {
            total += self
                .entries(&name)
                .await?
                .iter()
                .map(|e| e.metadata.size_bytes)
                .sum::<u64>();
        }
        Ok(total)
    }
}

/// A fresh id for one write's files, unique within and across processes.
fn unique_id() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!(
        "{:x}{:08x}{:x}",
        nanos,
        std::process::id(),
        WRITE_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

async fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", path)),
    }
}
