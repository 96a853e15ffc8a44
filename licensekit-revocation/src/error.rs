//! Error types for the revocation layer.

use licensekit_types::InvalidLicenseId;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for revocation operations.
pub type RevocationResult<T> = Result<T, RevocationError>;

/// Errors that can occur in blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object's current version did not match the expected one.
    #[error("version mismatch on {path}")]
    VersionMismatch { path: String },

    /// Object path is empty, absolute or escapes the storage root.
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur in revocation operations.
#[derive(Debug, Error)]
pub enum RevocationError {
    /// The supplied identifier is not a valid license ID.
    #[error("invalid license id {id:?}: {reason}")]
    InvalidId {
        id: String,
        #[source]
        reason: InvalidLicenseId,
    },

    /// Every conditional write lost to a concurrent writer.
    #[error("revocation record update failed after {attempts} attempts due to concurrent writers")]
    ConcurrentUpdateFailed { attempts: u32 },

    /// The stored record could not be parsed.
    #[error("revocation record is corrupt: {0}")]
    CorruptRecord(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RevocationError {
    /// Returns true if the caller supplied bad input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidId { .. })
    }

    /// Returns true if retrying the whole operation later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConcurrentUpdateFailed { .. } => true,
            Self::Storage(StorageError::Io(_) | StorageError::Backend(_)) => true,
            _ => false,
        }
    }
}
