//! In-memory blob storage.

use crate::error::{StorageError, StorageResult};
use crate::storage::{validate_object_path, BlobStorage, ObjectVersion, VersionedBlob};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    objects: HashMap<String, VersionedBlob>,
    generation: u64,
}

/// Process-local blob storage. Versions are monotonically increasing
/// generation numbers; the compare and the install happen under one lock.
#[derive(Default)]
pub struct MemoryBlobStorage {
    state: RwLock<State>,
}

impl MemoryBlobStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects.
    pub async fn len(&self) -> usize {
        self.state.read().await.objects.len()
    }

    /// Returns true if nothing has been written yet.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.objects.is_empty()
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, path: &str) -> StorageResult<Option<VersionedBlob>> {
        validate_object_path(path)?;
        Ok(self.state.read().await.objects.get(path).cloned())
    }

    async fn conditional_write(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        validate_object_path(path)?;
        let mut state = self.state.write().await;

        let current = state.objects.get(path).map(|blob| &blob.version);
        if current != expected {
            return Err(StorageError::VersionMismatch {
                path: path.to_string(),
            });
        }

        state.generation += 1;
        let version = ObjectVersion::new(state.generation.to_string());
        state.objects.insert(
            path.to_string(),
            VersionedBlob {
                data: data.to_vec(),
                version: version.clone(),
            },
        );
        Ok(version)
    }
}
