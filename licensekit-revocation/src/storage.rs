//! Blob storage abstraction trait.
//!
//! Defines the narrow interface the revocation store needs from a backend:
//! versioned reads and a conditional (compare-and-swap) write.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque version token (ETag, generation number, content hash).
///
/// Changes on every successful write to an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectVersion(String);

impl ObjectVersion {
    /// Wraps a backend-supplied token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An object's content together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedBlob {
    /// Object content.
    pub data: Vec<u8>,
    /// Version of this content.
    pub version: ObjectVersion,
}

/// Abstract blob storage interface.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Returns the name of the storage backend.
    fn backend_name(&self) -> &'static str;

    /// Reads an object. `None` if it does not exist.
    async fn read(&self, path: &str) -> StorageResult<Option<VersionedBlob>>;

    /// Replaces an object's content if and only if its current version
    /// equals `expected`. `expected == None` means the object must not exist
    /// yet. Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::VersionMismatch`] if the precondition failed;
    /// the object is then left untouched.
    async fn conditional_write(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion>;
}

/// Validates an object path: relative, `/`-separated, no empty, `.` or `..`
/// segments.
pub fn validate_object_path(path: &str) -> StorageResult<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        Err(StorageError::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}
