//! Signing key retrieval.
//!
//! The issuer never reaches for a global key store; it asks an injected
//! [`KeyProvider`] for key material by logical signer name.

use crate::error::{KeyProviderError, LicenseError, LicenseResult};
use async_trait::async_trait;
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Private key material as returned by a provider. Zeroed on drop.
///
/// Accepted encodings: a raw 32-byte Ed25519 seed, a PKCS#8 DER document, or
/// a PKCS#8 PEM document.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Generates a fresh random Ed25519 seed.
    #[must_use]
    pub fn generate_ed25519() -> Self {
        let key = SigningKey::generate(&mut OsRng);
        Self(key.to_bytes().to_vec())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&SigningKey> for KeyMaterial {
    fn from(key: &SigningKey) -> Self {
        Self(key.to_bytes().to_vec())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED; {} bytes])", self.0.len())
    }
}

/// Parses key material into an Ed25519 signing key.
///
/// # Errors
///
/// Returns [`LicenseError::SigningFailed`] if the material is in none of the
/// accepted encodings.
pub fn signing_key_from_material(material: &KeyMaterial) -> LicenseResult<SigningKey> {
    let bytes = material.as_bytes();

    if let Ok(seed) = <&[u8; SECRET_KEY_LENGTH]>::try_from(bytes) {
        return Ok(SigningKey::from_bytes(seed));
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        if text.trim_start().starts_with("-----BEGIN") {
            return SigningKey::from_pkcs8_pem(text.trim())
                .map_err(|e| LicenseError::SigningFailed(format!("invalid PKCS#8 PEM key: {e}")));
        }
    }

    SigningKey::from_pkcs8_der(bytes)
        .map_err(|e| LicenseError::SigningFailed(format!("unrecognized key material: {e}")))
}

/// Source of private signing keys, looked up by logical name.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Returns the private key material registered under `name`.
    async fn private_key(&self, name: &str) -> Result<KeyMaterial, KeyProviderError>;
}

/// In-memory key provider.
#[derive(Default)]
pub struct StaticKeyProvider {
    keys: HashMap<String, KeyMaterial>,
}

impl StaticKeyProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `material` under `name`, builder style.
    #[must_use]
    pub fn with_key(mut self, name: impl Into<String>, material: KeyMaterial) -> Self {
        self.keys.insert(name.into(), material);
        self
    }

    /// Registers `material` under `name`.
    pub fn insert(&mut self, name: impl Into<String>, material: KeyMaterial) {
        self.keys.insert(name.into(), material);
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn private_key(&self, name: &str) -> Result<KeyMaterial, KeyProviderError> {
        self.keys
            .get(name)
            .cloned()
            .ok_or_else(|| KeyProviderError::NotFound(name.to_string()))
    }
}

/// Loads keys from a directory: `<dir>/<name>.pem` (PKCS#8 PEM), falling
/// back to `<dir>/<name>.key` (raw seed or PKCS#8 DER).
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    dir: PathBuf,
}

impl FileKeyProvider {
    /// Creates a provider rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the key directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the raw-seed file for `name`.
    pub fn raw_key_path(&self, name: &str) -> Result<PathBuf, KeyProviderError> {
        validate_key_name(name)?;
        Ok(self.dir.join(format!("{name}.key")))
    }

    /// Path of the PKCS#8 PEM file for `name`.
    pub fn pem_key_path(&self, name: &str) -> Result<PathBuf, KeyProviderError> {
        validate_key_name(name)?;
        Ok(self.dir.join(format!("{name}.pem")))
    }
}

// Names end up in file paths, so only `[A-Za-z0-9_-]` is allowed.
fn validate_key_name(name: &str) -> Result<(), KeyProviderError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(KeyProviderError::InvalidName(name.to_string()))
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, KeyProviderError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl KeyProvider for FileKeyProvider {
    async fn private_key(&self, name: &str) -> Result<KeyMaterial, KeyProviderError> {
        for path in [self.pem_key_path(name)?, self.raw_key_path(name)?] {
            if let Some(bytes) = read_if_exists(&path).await? {
                debug!(path = %path.display(), "Loaded signing key");
                return Ok(KeyMaterial::new(bytes));
            }
        }
        Err(KeyProviderError::NotFound(name.to_string()))
    }
}

/// Read-through cache in front of another provider. Failures are not cached.
pub struct CachedKeyProvider<P> {
    inner: P,
    cache: RwLock<HashMap<String, KeyMaterial>>,
}

impl<P: KeyProvider> CachedKeyProvider<P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drops every cached key, forcing the next lookup through to `inner`.
    pub async fn invalidate(&self) {
        self.cache.write().await.clear();
    }
}

#[async_trait]
impl<P: KeyProvider> KeyProvider for CachedKeyProvider<P> {
    async fn private_key(&self, name: &str) -> Result<KeyMaterial, KeyProviderError> {
        if let Some(material) = self.cache.read().await.get(name) {
            return Ok(material.clone());
        }

        let material = self.inner.private_key(name).await?;
        self.cache
            .write()
            .await
            .insert(name.to_string(), material.clone());
        Ok(material)
    }
}
