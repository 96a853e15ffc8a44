//! The revocation store and its compare-and-swap retry loop.

use crate::error::{RevocationError, RevocationResult, StorageError};
use crate::record::RevocationRecord;
use crate::storage::BlobStorage;
use licensekit_types::LicenseId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Object path of the record when none is configured.
pub const DEFAULT_RECORD_PATH: &str = "revocations.json";

/// Bounded exponential backoff between conflicting writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total conditional-write attempts per revocation (at least 1).
    pub max_attempts: u32,
    /// Backoff ceiling after the first conflict, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single backoff, in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_backoff_ms: 25,
            max_backoff_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff ceiling after the `attempt`-th conflict (1-based): the initial
    /// backoff doubled per attempt, capped at `max_backoff_ms`.
    #[must_use]
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(20);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Jittered delay in `[ceiling / 2, ceiling]`, so writers that collided
    /// do not retry in lockstep.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt).as_millis() as u64;
        let floor = ceiling / 2;
        Duration::from_millis(rand::thread_rng().gen_range(floor..=ceiling))
    }
}

/// Configuration for a [`RevocationStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationConfig {
    /// Path of the record object within the storage backend.
    pub object_path: String,
    /// Retry policy for conflicting writes.
    pub retry: RetryPolicy,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            object_path: DEFAULT_RECORD_PATH.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Successful outcome of [`RevocationStore::revoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The ID was added to the record.
    Revoked,
    /// The ID was already revoked; nothing was written.
    AlreadyRevoked,
}

/// Owner of the revocation record. Never writes unconditionally.
pub struct RevocationStore {
    storage: Arc<dyn BlobStorage>,
    config: RevocationConfig,
}

impl RevocationStore {
    /// Creates a store over `storage`.
    pub fn new(storage: Arc<dyn BlobStorage>, config: RevocationConfig) -> Self {
        Self { storage, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RevocationConfig {
        &self.config
    }

    /// Returns the storage backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }

    /// Durably adds `id` to the revocation record.
    ///
    /// Reads the record and its version, adds the ID, and installs the new
    /// record only if the version is unchanged. A version conflict restarts
    /// from the read after a backoff, up to `retry.max_attempts` times.
    ///
    /// # Errors
    ///
    /// - [`RevocationError::InvalidId`] if `id` is not a valid license ID
    /// - [`RevocationError::ConcurrentUpdateFailed`] if every attempt conflicted
    /// - [`RevocationError::CorruptRecord`] if the stored record cannot be parsed
    /// - [`RevocationError::Storage`] on any other backend failure
    pub async fn revoke(&self, id: &str) -> RevocationResult<RevokeOutcome> {
        let id = LicenseId::parse(id).map_err(|reason| RevocationError::InvalidId {
            id: id.to_string(),
            reason,
        })?;
        let path = self.config.object_path.as_str();
        let max_attempts = self.config.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            debug!(license_id = %id, attempt, "Reading revocation record");
            let (mut record, expected) = match self.storage.read(path).await? {
                Some(blob) => (RevocationRecord::decode(&blob.data)?, Some(blob.version)),
                None => (RevocationRecord::new(), None),
            };

            if !record.insert(&id) {
                debug!(license_id = %id, "License already revoked");
                return Ok(RevokeOutcome::AlreadyRevoked);
            }

            let bytes = record.encode()?;
            match self
                .storage
                .conditional_write(path, &bytes, expected.as_ref())
                .await
            {
                Ok(version) => {
                    info!(
                        license_id = %id,
                        attempt,
                        version = %version,
                        revoked_count = record.len(),
                        "Revoked license"
                    );
                    return Ok(RevokeOutcome::Revoked);
                }
                Err(StorageError::VersionMismatch { .. }) => {
                    warn!(license_id = %id, attempt, "Revocation record changed concurrently");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry.backoff(attempt)).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(license_id = %id, attempts = max_attempts, "Giving up on revocation");
        Err(RevocationError::ConcurrentUpdateFailed {
            attempts: max_attempts,
        })
    }

    /// Returns true if `id` is in the record. Performs a single read.
    ///
    /// No format check beyond rejecting the empty string, so IDs recorded
    /// by older writers stay queryable.
    pub async fn is_revoked(&self, id: &str) -> RevocationResult<bool> {
        if id.is_empty() {
            return Ok(false);
        }
        Ok(self.load().await?.contains(id))
    }

    /// Returns every revoked ID, sorted.
    pub async fn revoked_ids(&self) -> RevocationResult<Vec<String>> {
        Ok(self.load().await?.iter().map(str::to_string).collect())
    }

    async fn load(&self) -> RevocationResult<RevocationRecord> {
        match self.storage.read(&self.config.object_path).await? {
            Some(blob) => RevocationRecord::decode(&blob.data),
            None => Ok(RevocationRecord::new()),
        }
    }
}
