//! The license record and its signed token encoding.
//!
//! Tokens use the format: `base64url(payload).base64url(signature)`
//!
//! The payload is a compact JSON object, fields in this fixed order:
//! - `id`: license identifier (string)
//! - `product`: licensed product name (string, non-empty)
//! - `iat`: issued-at timestamp (seconds since epoch)
//!
//! The signature covers `payload_b64.as_bytes()` (the base64url-encoded
//! payload string, not the decoded JSON). Decoding keeps the payload segment
//! verbatim, so a decoded token always re-encodes to the same string.

use crate::error::{LicenseError, LicenseResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use licensekit_types::LicenseId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// One issued grant of use for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Unique license identifier.
    pub id: LicenseId,
    /// Licensed product name.
    pub product: String,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(rename = "iat")]
    pub issued_at: i64,
}

impl License {
    /// Creates a license for `product` with a fresh identifier, issued now.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidProduct`] if `product` is empty or only
    /// whitespace.
    pub fn new(product: &str) -> LicenseResult<Self> {
        Self::from_parts(
            LicenseId::generate(),
            product,
            chrono::Utc::now().timestamp(),
        )
    }

    /// Assembles a license from existing fields.
    pub fn from_parts(id: LicenseId, product: &str, issued_at: i64) -> LicenseResult<Self> {
        if product.trim().is_empty() {
            return Err(LicenseError::InvalidProduct);
        }
        Ok(Self {
            id,
            product: product.to_string(),
            issued_at,
        })
    }

    /// Returns the canonical signed bytes: base64url of the compact JSON payload.
    pub fn canonical_payload(&self) -> LicenseResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

/// A license together with its Ed25519 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLicense {
    license: License,
    payload_b64: String,
    signature: [u8; SIGNATURE_LENGTH],
}

impl SignedLicense {
    /// Signs `license` with `key`.
    pub fn sign(license: License, key: &SigningKey) -> LicenseResult<Self> {
        let payload_b64 = license.canonical_payload()?;
        let signature = key
            .try_sign(payload_b64.as_bytes())
            .map_err(|e| LicenseError::SigningFailed(e.to_string()))?;

        Ok(Self {
            license,
            payload_b64,
            signature: signature.to_bytes(),
        })
    }

    /// Decodes a token string without checking its signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not two base64url segments, the
    /// signature has the wrong length, or the payload is not a valid license.
    pub fn decode(token: &str) -> LicenseResult<Self> {
        let token = token.trim();

        let Some((payload_b64, signature_b64)) = token.split_once('.') else {
            return Err(LicenseError::InvalidTokenFormat(
                "token must have exactly two parts separated by a dot".to_string(),
            ));
        };
        if signature_b64.contains('.') {
            return Err(LicenseError::InvalidTokenFormat(
                "token must have exactly two parts separated by a dot".to_string(),
            ));
        }

        let sig_bytes = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
            LicenseError::InvalidTokenFormat(format!("invalid signature base64: {e}"))
        })?;
        let signature: [u8; SIGNATURE_LENGTH] = sig_bytes.try_into().map_err(|_| {
            LicenseError::InvalidTokenFormat("invalid signature length".to_string())
        })?;

        let payload_json = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|e| {
            LicenseError::InvalidTokenFormat(format!("invalid payload base64: {e}"))
        })?;
        let license: License = serde_json::from_slice(&payload_json)
            .map_err(|e| LicenseError::InvalidPayload(format!("invalid payload JSON: {e}")))?;
        if license.product.trim().is_empty() {
            return Err(LicenseError::InvalidPayload("empty product".to_string()));
        }

        Ok(Self {
            license,
            payload_b64: payload_b64.to_string(),
            signature,
        })
    }

    /// Encodes the token string. Exact inverse of [`SignedLicense::decode`].
    #[must_use]
    pub fn encode(&self) -> String {
        let sig_b64 = URL_SAFE_NO_PAD.encode(self.signature);
        format!("{}.{sig_b64}", self.payload_b64)
    }

    /// Checks the signature against a raw 32-byte Ed25519 public key.
    pub fn verify(&self, public_key: &[u8; 32]) -> LicenseResult<()> {
        let verifying_key = VerifyingKey::from_bytes(public_key)
            .map_err(|_| LicenseError::InvalidTokenFormat("invalid public key".to_string()))?;
        let signature = Signature::from_bytes(&self.signature);

        verifying_key
            .verify(self.payload_b64.as_bytes(), &signature)
            .map_err(|_| LicenseError::InvalidSignature)
    }

    /// Returns the decoded license.
    #[must_use]
    pub fn license(&self) -> &License {
        &self.license
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.signature
    }

    /// Returns the base64url payload segment the signature covers.
    #[must_use]
    pub fn payload_segment(&self) -> &str {
        &self.payload_b64
    }
}

impl fmt::Display for SignedLicense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
