//! Error types for license issuance.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The requested product name was empty.
    #[error("product name must not be empty")]
    InvalidProduct,

    /// The signing key could not be retrieved.
    #[error("signing key {signer:?} unavailable: {source}")]
    KeyUnavailable {
        /// Logical name of the signer that was requested.
        signer: String,
        #[source]
        source: KeyProviderError,
    },

    /// The key material was unusable or signing itself failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Token is not `payload.signature` or a segment is not valid base64url.
    #[error("invalid license token format: {0}")]
    InvalidTokenFormat(String),

    /// Ed25519 signature verification failed.
    #[error("license token signature invalid")]
    InvalidSignature,

    /// Payload JSON is malformed or missing required fields.
    #[error("invalid license payload: {0}")]
    InvalidPayload(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns true if the caller supplied bad input and retrying unchanged
    /// cannot succeed.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidProduct
                | Self::InvalidTokenFormat(_)
                | Self::InvalidSignature
                | Self::InvalidPayload(_)
        )
    }
}

/// Errors returned by a [`crate::KeyProvider`].
#[derive(Debug, Error)]
pub enum KeyProviderError {
    /// No key is registered under this name.
    #[error("no key named {0:?}")]
    NotFound(String),

    /// The key name contains characters that are not allowed.
    #[error("invalid key name {0:?}")]
    InvalidName(String),

    /// IO error while loading key material.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other provider failure.
    #[error("key provider error: {0}")]
    Backend(String),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
