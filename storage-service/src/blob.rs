//! Blob object store.
//!
//! A keyed blob store behind an async interface: list / head / get / put /
//! delete, with last-write-wins semantics on concurrent puts and idempotent
//! deletes. The filesystem implementation keeps object bytes under
//! `<root>/objects/` and a JSON metadata sidecar under `<root>/meta/`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

/// Maximum number of objects returned by a single listing.
const LIST_LIMIT: usize = 1000;

/// Metadata for a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Content type (MIME).
    pub content_type: String,
    /// Content length in bytes.
    pub size: u64,
    /// ETag (hex SHA-256 of the content).
    pub etag: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
    /// Custom metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A listed object: key plus metadata.
#[derive(Debug, Clone)]
pub struct BlobObject {
    pub key: String,
    pub metadata: BlobMetadata,
}

/// Result of a listing: objects plus a truncation flag.
#[derive(Debug)]
pub struct BlobListing {
    pub objects: Vec<BlobObject>,
    pub truncated: bool,
}

/// Keyed blob store operations.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Lists objects in key order, truncated past the listing cap.
    async fn list(&self) -> AppResult<BlobListing>;

    /// Returns metadata for `key`, or `None` when absent.
    async fn head(&self, key: &str) -> AppResult<Option<BlobMetadata>>;

    /// Returns content and metadata for `key`, or `None` when absent.
    async fn get(&self, key: &str) -> AppResult<Option<(Vec<u8>, BlobMetadata)>>;

    /// Stores an object, overwriting any previous version (last write wins).
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> AppResult<BlobMetadata>;

    /// Deletes an object. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Filesystem-backed blob store.
pub struct FsBlobStore {
    objects_dir: PathBuf,
    meta_dir: PathBuf,
}

impl FsBlobStore {
    /// Creates a store rooted at `root` (directories created on demand).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            objects_dir: root.join("objects"),
            meta_dir: root.join("meta"),
        }
    }

    /// Validates a key and maps it to a relative path.
    ///
    /// Keys must be non-empty, relative, and free of `.`/`..` components so
    /// they cannot escape the store root.
    fn key_path(key: &str) -> AppResult<PathBuf> {
        if key.is_empty() {
            return Err(AppError::BadRequest("object key must not be empty".into()));
        }
        let path = Path::new(key);
        let safe = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::BadRequest(format!("invalid object key: {key}")));
        }
        Ok(path.to_path_buf())
    }

    fn object_path(&self, key: &str) -> AppResult<PathBuf> {
        Ok(self.objects_dir.join(Self::key_path(key)?))
    }

    fn meta_path(&self, key: &str) -> AppResult<PathBuf> {
        let mut path = self.meta_dir.join(Self::key_path(key)?);
        let file_name = path
            .file_name()
            .map(|n| format!("{}.json", n.to_string_lossy()))
            .unwrap_or_else(|| ".json".to_string());
        path.set_file_name(file_name);
        Ok(path)
    }

    async fn read_metadata(&self, key: &str) -> AppResult<Option<BlobMetadata>> {
        let meta_path = self.meta_path(key)?;
        match fs::read(&meta_path).await {
            Ok(raw) => {
                let meta: BlobMetadata = serde_json::from_slice(&raw)
                    .map_err(|e| AppError::Blob(format!("corrupt metadata for {key}: {e}")))?;
                Ok(Some(meta))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Object dropped into the store out of band: synthesize
                // metadata from the file itself.
                let object_path = self.object_path(key)?;
                match fs::read(&object_path).await {
                    Ok(bytes) => Ok(Some(synthesize_metadata(&bytes))),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Collects all object keys under the objects directory, sorted.
    async fn walk_keys(&self) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.objects_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Ok(rel) = path.strip_prefix(&self.objects_dir) {
                    keys.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn compute_etag(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn synthesize_metadata(bytes: &[u8]) -> BlobMetadata {
    BlobMetadata {
        content_type: "application/octet-stream".to_string(),
        size: bytes.len() as u64,
        etag: compute_etag(bytes),
        uploaded_at: Utc::now(),
        metadata: HashMap::new(),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn list(&self) -> AppResult<BlobListing> {
        let keys = self.walk_keys().await?;
        let truncated = keys.len() > LIST_LIMIT;

        let mut objects = Vec::new();
        for key in keys.into_iter().take(LIST_LIMIT) {
            if let Some(metadata) = self.read_metadata(&key).await? {
                objects.push(BlobObject { key, metadata });
            }
        }
        Ok(BlobListing { objects, truncated })
    }

    async fn head(&self, key: &str) -> AppResult<Option<BlobMetadata>> {
        self.read_metadata(key).await
    }

    async fn get(&self, key: &str) -> AppResult<Option<(Vec<u8>, BlobMetadata)>> {
        let object_path = self.object_path(key)?;
        let bytes = match fs::read(&object_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let metadata = self
            .read_metadata(key)
            .await?
            .unwrap_or_else(|| synthesize_metadata(&bytes));
        Ok(Some((bytes, metadata)))
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        metadata: HashMap<String, String>,
    ) -> AppResult<BlobMetadata> {
        let object_path = self.object_path(key)?;
        let meta_path = self.meta_path(key)?;

        let meta = BlobMetadata {
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            etag: compute_etag(&bytes),
            uploaded_at: Utc::now(),
            metadata,
        };

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Some(parent) = meta_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&object_path, &bytes).await?;
        fs::write(&meta_path, serde_json::to_vec(&meta).map_err(|e| AppError::Blob(e.to_string()))?)
            .await?;

        Ok(meta)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let object_path = self.object_path(key)?;
        let meta_path = self.meta_path(key)?;

        for path in [object_path, meta_path] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
