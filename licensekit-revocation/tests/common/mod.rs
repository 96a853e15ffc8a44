//! Shared test helpers for revocation tests.

#![allow(dead_code)]

use async_trait::async_trait;
use licensekit_revocation::{
    BlobStorage, MemoryBlobStorage, ObjectVersion, RetryPolicy, RevocationConfig,
    RevocationRecord, RevocationStore, StorageError, StorageResult, VersionedBlob,
};
use licensekit_types::LicenseId;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Retry policy with tiny backoffs so tests stay fast.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    }
}

pub fn store_over(storage: Arc<dyn BlobStorage>, max_attempts: u32) -> RevocationStore {
    RevocationStore::new(
        storage,
        RevocationConfig {
            retry: fast_retry(max_attempts),
            ..RevocationConfig::default()
        },
    )
}

/// Commits a write that bumps the object's version, as a concurrent writer
/// would. Content is preserved; an absent object is created empty. Losing
/// this race to a real writer is fine: the version moved either way.
async fn interfere(inner: &MemoryBlobStorage, path: &str) {
    let _ = match inner.read(path).await.unwrap() {
        Some(blob) => {
            inner
                .conditional_write(path, &blob.data, Some(&blob.version))
                .await
        }
        None => {
            let empty = RevocationRecord::new().encode().unwrap();
            inner.conditional_write(path, &empty, None).await
        }
    };
}

/// Injects version conflicts in front of a [`MemoryBlobStorage`].
///
/// Before a conditional write is forwarded, a simulated rival writer may
/// commit first, which makes the forwarded write fail with a version
/// mismatch.
pub struct ConflictInjectingStorage {
    pub inner: Arc<MemoryBlobStorage>,
    forced: AtomicUsize,
    rate: f64,
    pub injected: AtomicUsize,
    pub writes: AtomicUsize,
}

impl ConflictInjectingStorage {
    /// Conflicts on the first `n` writes, then behaves normally.
    pub fn first_n(inner: Arc<MemoryBlobStorage>, n: usize) -> Self {
        Self {
            inner,
            forced: AtomicUsize::new(n),
            rate: 0.0,
            injected: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Conflicts on each write with probability `rate`.
    pub fn random(inner: Arc<MemoryBlobStorage>, rate: f64) -> Self {
        Self {
            inner,
            forced: AtomicUsize::new(0),
            rate,
            injected: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Conflicts on every write.
    pub fn always(inner: Arc<MemoryBlobStorage>) -> Self {
        Self::first_n(inner, usize::MAX)
    }

    fn should_inject(&self) -> bool {
        let forced = self
            .forced
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        forced || rand::thread_rng().gen_bool(self.rate)
    }
}

#[async_trait]
impl BlobStorage for ConflictInjectingStorage {
    fn backend_name(&self) -> &'static str {
        "conflict-injecting"
    }

    async fn read(&self, path: &str) -> StorageResult<Option<VersionedBlob>> {
        self.inner.read(path).await
    }

    async fn conditional_write(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.should_inject() {
            self.injected.fetch_add(1, Ordering::SeqCst);
            interfere(&self.inner, path).await;
        }
        self.inner.conditional_write(path, data, expected).await
    }
}

/// A rival writer that successfully revokes one of its own IDs right before
/// each forwarded write, so every forwarded write loses.
pub struct RivalWriterStorage {
    pub inner: Arc<MemoryBlobStorage>,
    rival_ids: Vec<LicenseId>,
    next: AtomicUsize,
}

impl RivalWriterStorage {
    pub fn new(inner: Arc<MemoryBlobStorage>, rival_ids: Vec<LicenseId>) -> Self {
        Self {
            inner,
            rival_ids,
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlobStorage for RivalWriterStorage {
    fn backend_name(&self) -> &'static str {
        "rival-writer"
    }

    async fn read(&self, path: &str) -> StorageResult<Option<VersionedBlob>> {
        self.inner.read(path).await
    }

    async fn conditional_write(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        if let Some(rival) = self.rival_ids.get(i) {
            let current = self.inner.read(path).await?;
            let (mut record, version) = match current {
                Some(blob) => (RevocationRecord::decode(&blob.data).unwrap(), Some(blob.version)),
                None => (RevocationRecord::new(), None),
            };
            record.insert(rival);
            self.inner
                .conditional_write(path, &record.encode().unwrap(), version.as_ref())
                .await?;
        }
        self.inner.conditional_write(path, data, expected).await
    }
}

/// Fails with a backend error, counting every call that reaches it.
pub struct BrokenStorage {
    reads_fail: bool,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl BrokenStorage {
    /// Fails every read and write.
    pub fn new() -> Self {
        Self {
            reads_fail: true,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Reads see an absent record; every write fails.
    pub fn failing_writes() -> Self {
        Self {
            reads_fail: false,
            ..Self::new()
        }
    }
}

#[async_trait]
impl BlobStorage for BrokenStorage {
    fn backend_name(&self) -> &'static str {
        "broken"
    }

    async fn read(&self, _path: &str) -> StorageResult<Option<VersionedBlob>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.reads_fail {
            return Err(StorageError::Backend("bucket unreachable".to_string()));
        }
        Ok(None)
    }

    async fn conditional_write(
        &self,
        _path: &str,
        _data: &[u8],
        _expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Backend("bucket unreachable".to_string()))
    }
}

pub fn ids(n: usize) -> Vec<LicenseId> {
    (0..n).map(|_| LicenseId::generate()).collect()
}
