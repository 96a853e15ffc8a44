//! Local filesystem blob storage.
//!
//! Objects are plain files under a root directory. The version of an object
//! is the SHA-256 of its content, which works like a content-derived ETag.
//! Writes go to a temporary file that is synced and then renamed over the
//! target, so a reader sees either the old or the new file, never a partial
//! one, and a crash cannot leave an empty record behind.
//!
//! The compare-and-swap is serialized by a lock owned by this instance; all
//! writers must share one `FsBlobStorage`.

use crate::error::{StorageError, StorageResult};
use crate::storage::{validate_object_path, BlobStorage, ObjectVersion, VersionedBlob};
use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Filesystem-backed blob storage.
pub struct FsBlobStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStorage {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the version a blob with this content would have.
    #[must_use]
    pub fn content_version(data: &[u8]) -> ObjectVersion {
        ObjectVersion::new(hex::encode(Sha256::digest(data)))
    }

    fn object_path(&self, path: &str) -> StorageResult<PathBuf> {
        validate_object_path(path)?;
        Ok(self.root.join(path))
    }

    /// Writes `data` to a fresh file and flushes it to disk before returning.
    async fn write_durable(tmp: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await
    }

    async fn read_file(file: &Path) -> StorageResult<Option<VersionedBlob>> {
        match fs::read(file).await {
            Ok(data) => {
                let version = Self::content_version(&data);
                Ok(Some(VersionedBlob { data, version }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStorage for FsBlobStorage {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn read(&self, path: &str) -> StorageResult<Option<VersionedBlob>> {
        let file = self.object_path(path)?;
        Self::read_file(&file).await
    }

    async fn conditional_write(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        let file = self.object_path(path)?;
        let _guard = self.write_lock.lock().await;

        let current = Self::read_file(&file).await?;
        if current.as_ref().map(|blob| &blob.version) != expected {
            debug!(path, "Conditional write rejected: version changed");
            return Err(StorageError::VersionMismatch {
                path: path.to_string(),
            });
        }

        let parent = file
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
            info!("Created storage directory: {:?}", parent);
        }

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let suffix: u64 = rand::thread_rng().r#gen();
        let tmp = parent.join(format!(".{file_name}.{suffix:016x}.tmp"));

        if let Err(e) = Self::write_durable(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &file).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        #[cfg(unix)]
        fs::File::open(parent).await?.sync_all().await?;

        Ok(Self::content_version(data))
    }
}
