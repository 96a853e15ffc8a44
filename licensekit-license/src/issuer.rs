//! License issuance.

use crate::error::{LicenseError, LicenseResult};
use crate::keys::{signing_key_from_material, KeyProvider};
use crate::license::{License, SignedLicense};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Signer name used when none is configured.
pub const DEFAULT_SIGNER: &str = "plugin";

/// Configuration for a [`LicenseIssuer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Logical name of the signing key requested from the key provider.
    pub signer: String,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            signer: DEFAULT_SIGNER.to_string(),
        }
    }
}

/// Issues signed licenses. Holds no mutable state; safe to share across tasks.
pub struct LicenseIssuer {
    keys: Arc<dyn KeyProvider>,
    config: IssuerConfig,
}

impl LicenseIssuer {
    /// Creates an issuer backed by `keys`.
    pub fn new(keys: Arc<dyn KeyProvider>, config: IssuerConfig) -> Self {
        Self { keys, config }
    }

    /// Returns the configured signer name.
    #[must_use]
    pub fn signer(&self) -> &str {
        &self.config.signer
    }

    /// Creates and signs a license for `product`.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidProduct`] if `product` is empty
    /// - [`LicenseError::KeyUnavailable`] if the key provider fails
    /// - [`LicenseError::SigningFailed`] if the key material is unusable
    pub async fn create_license(&self, product: &str) -> LicenseResult<SignedLicense> {
        let license = License::new(product)?;
        let key = self.signing_key().await?;
        let signed = SignedLicense::sign(license, &key)?;

        info!(
            license_id = %signed.license().id,
            product = %signed.license().product,
            signer = %self.config.signer,
            "Issued license"
        );
        Ok(signed)
    }

    /// Returns the raw 32-byte public key matching the signer's private key.
    pub async fn public_key(&self) -> LicenseResult<[u8; 32]> {
        let key = self.signing_key().await?;
        Ok(key.verifying_key().to_bytes())
    }

    async fn signing_key(&self) -> LicenseResult<SigningKey> {
        let material = self
            .keys
            .private_key(&self.config.signer)
            .await
            .map_err(|source| {
                warn!(signer = %self.config.signer, error = %source, "Signing key unavailable");
                LicenseError::KeyUnavailable {
                    signer: self.config.signer.clone(),
                    source,
                }
            })?;
        signing_key_from_material(&material)
    }
}
