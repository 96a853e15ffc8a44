//! License issuance for licensekit.
//!
//! This crate handles:
//! - Building the canonical license record (id, product, issued-at)
//! - Signing it with an Ed25519 key obtained from a [`KeyProvider`]
//! - Encoding and decoding the resulting self-contained token
//!
//! # Token Format
//!
//! Tokens are formatted as: `base64url(payload).base64url(signature)`
//! The payload is compact JSON with the fields `id`, `product`, `iat` in that
//! order. The signature covers the base64url payload string, so a verifier
//! checks the bytes exactly as they appear in the token.
//!
//! The issuer has no knowledge of revocation; that lives in
//! `licensekit-revocation`.

mod error;
mod issuer;
mod keys;
mod license;

pub use error::{KeyProviderError, LicenseError, LicenseResult};
pub use issuer::{IssuerConfig, LicenseIssuer, DEFAULT_SIGNER};
pub use keys::{
    signing_key_from_material, CachedKeyProvider, FileKeyProvider, KeyMaterial, KeyProvider,
    StaticKeyProvider,
};
pub use license::{License, SignedLicense, SIGNATURE_LENGTH};
