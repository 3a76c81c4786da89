//! Blob storage for uploaded payment slips
//!
//! Keys are relative paths like `slips/SC-0000001.png`. The
//! filesystem store writes under its root (served statically at
//! `/uploads/...`) and returns absolute public URLs. The in-memory
//! store backs tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Blob I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, returning the public URL
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<String>;

    /// Remove the blob behind a previously returned public URL.
    /// Removing something that is already gone is not an error.
    async fn remove_by_url(&self, url: &str) -> BlobResult<()>;
}

/// Reject keys that could escape the storage root
fn validate_key(key: &str) -> BlobResult<PathBuf> {
    let path = Path::new(key);
    let clean = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if key.is_empty() || !clean {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(path.to_path_buf())
}

/// Filesystem store under `<root>`, served at `<base_url>/uploads/`
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/uploads/{}", self.base_url, key)
    }

    /// Map a public URL back to the relative key, if it is ours
    fn key_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/uploads/", self.base_url);
        url.strip_prefix(&prefix).map(str::to_string)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<String> {
        let rel = validate_key(key)?;
        let full = self.root.join(rel);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(self.url_for(key))
    }

    async fn remove_by_url(&self, url: &str) -> BlobResult<()> {
        let Some(key) = self.key_from_url(url) else {
            // Foreign URL; nothing of ours to remove
            return Ok(());
        };
        let rel = validate_key(&key)?;
        match tokio::fs::remove_file(self.root.join(rel)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().is_ok_and(|b| b.contains_key(key))
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> BlobResult<String> {
        validate_key(key)?;
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.to_string(), bytes);
        }
        Ok(format!("memory:///uploads/{key}"))
    }

    async fn remove_by_url(&self, url: &str) -> BlobResult<()> {
        if let Some(key) = url.strip_prefix("memory:///uploads/") {
            if let Ok(mut blobs) = self.blobs.lock() {
                blobs.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("slips/SC-0000001.png").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("slips/../../x").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("").is_err());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryBlobStore::new();
        let url = store.put("slips/a.png", vec![1, 2, 3]).await.unwrap();
        assert!(store.contains("slips/a.png"));
        store.remove_by_url(&url).await.unwrap();
        assert!(!store.contains("slips/a.png"));
        // Removing again is fine
        store.remove_by_url(&url).await.unwrap();
    }

    #[tokio::test]
    async fn fs_store_writes_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost:3000");
        let url = store.put("slips/b.pdf", b"pdf".to_vec()).await.unwrap();
        assert_eq!(url, "http://localhost:3000/uploads/slips/b.pdf");
        assert!(dir.path().join("slips/b.pdf").exists());

        store.remove_by_url(&url).await.unwrap();
        assert!(!dir.path().join("slips/b.pdf").exists());
    }

    #[tokio::test]
    async fn foreign_urls_are_ignored_on_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost:3000");
        store
            .remove_by_url("https://elsewhere.example/uploads/x.png")
            .await
            .unwrap();
    }
}
