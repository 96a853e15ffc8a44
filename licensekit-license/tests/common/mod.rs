//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use licensekit_license::{
    IssuerConfig, KeyMaterial, KeyProvider, KeyProviderError, LicenseIssuer, StaticKeyProvider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (SigningKey, [u8; 32]) {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key.to_bytes())
}

/// An issuer whose default signer resolves to [`test_keypair`].
pub fn test_issuer() -> (LicenseIssuer, [u8; 32]) {
    let (sk, pk) = test_keypair();
    let provider = StaticKeyProvider::new().with_key("plugin", KeyMaterial::from(&sk));
    (
        LicenseIssuer::new(Arc::new(provider), IssuerConfig::default()),
        pk,
    )
}

/// A provider that always fails and counts how often it was asked.
#[derive(Default)]
pub struct FailingKeyProvider {
    pub calls: AtomicUsize,
}

#[async_trait]
impl KeyProvider for FailingKeyProvider {
    async fn private_key(&self, _name: &str) -> Result<KeyMaterial, KeyProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(KeyProviderError::Backend("datastore offline".to_string()))
    }
}

/// A provider that counts lookups and serves a fixed key.
pub struct CountingKeyProvider {
    pub calls: AtomicUsize,
    material: KeyMaterial,
}

impl CountingKeyProvider {
    pub fn new(material: KeyMaterial) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            material,
        }
    }
}

#[async_trait]
impl KeyProvider for CountingKeyProvider {
    async fn private_key(&self, _name: &str) -> Result<KeyMaterial, KeyProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.material.clone())
    }
}
