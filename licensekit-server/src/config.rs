//! Command-line and environment configuration for the server binary.

use std::{fs, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use licensekit_license::{
    CachedKeyProvider, FileKeyProvider, IssuerConfig, KeyMaterial, LicenseIssuer, DEFAULT_SIGNER,
};
use licensekit_revocation::{
    BlobStorage, FsBlobStorage, MemoryBlobStorage, RetryPolicy, RevocationConfig,
    RevocationStore, DEFAULT_RECORD_PATH,
};
use tracing::{info, warn};

use crate::routes::AppState;

/// Where the revocation record lives.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    /// Process memory; lost on restart.
    Memory,
    /// A directory on the local filesystem.
    Fs,
    /// An S3 bucket (requires the `s3` feature).
    S3,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "licensekit-server")]
#[command(about = "License issuance and revocation service", version)]
pub struct ServerConfig {
    /// Address for the HTTP API
    #[arg(long, env = "LICENSEKIT_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Storage backend for the revocation record
    #[arg(long, env = "LICENSEKIT_STORAGE", value_enum, default_value_t = StorageKind::Fs)]
    pub storage: StorageKind,

    /// Data directory for the fs backend
    #[arg(long, env = "LICENSEKIT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Bucket for the s3 backend
    #[arg(long, env = "LICENSEKIT_BUCKET")]
    pub bucket: Option<String>,

    /// Key prefix inside the bucket
    #[arg(long, env = "LICENSEKIT_PREFIX", default_value = "")]
    pub prefix: String,

    /// Object path of the revocation record
    #[arg(long, env = "LICENSEKIT_REVOCATION_PATH", default_value = DEFAULT_RECORD_PATH)]
    pub revocation_path: String,

    /// Directory holding `<signer>.pem` or `<signer>.key`
    #[arg(long, env = "LICENSEKIT_KEYS_DIR", default_value = "keys")]
    pub keys_dir: PathBuf,

    /// Name of the signing key
    #[arg(long, env = "LICENSEKIT_SIGNER", default_value = DEFAULT_SIGNER)]
    pub signer: String,

    /// Generate the signing key if none exists
    #[arg(long, env = "LICENSEKIT_GENERATE_KEY")]
    pub generate_key: bool,

    /// Attempts per revocation before giving up on contention
    #[arg(long, env = "LICENSEKIT_MAX_ATTEMPTS", default_value_t = RetryPolicy::default().max_attempts)]
    pub max_attempts: u32,

    /// Enable verbose debug logging
    #[arg(short, long, env = "LICENSEKIT_VERBOSE")]
    pub verbose: bool,
}

impl ServerConfig {
    pub fn issuer_config(&self) -> IssuerConfig {
        IssuerConfig {
            signer: self.signer.clone(),
        }
    }

    pub fn revocation_config(&self) -> RevocationConfig {
        RevocationConfig {
            object_path: self.revocation_path.clone(),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            },
        }
    }

    /// Builds the blob storage selected by `--storage`.
    pub async fn blob_storage(&self) -> Result<Arc<dyn BlobStorage>> {
        match self.storage {
            StorageKind::Memory => {
                warn!("Using in-memory storage; revocations are lost on restart");
                Ok(Arc::new(MemoryBlobStorage::new()))
            }
            StorageKind::Fs => {
                fs::create_dir_all(&self.data_dir).with_context(|| {
                    format!("Failed to create data directory {:?}", self.data_dir)
                })?;
                Ok(Arc::new(FsBlobStorage::new(&self.data_dir)))
            }
            StorageKind::S3 => self.s3_storage().await,
        }
    }

    #[cfg(feature = "s3")]
    async fn s3_storage(&self) -> Result<Arc<dyn BlobStorage>> {
        let Some(bucket) = self.bucket.as_deref() else {
            bail!("--bucket is required for s3 storage");
        };
        let storage =
            licensekit_revocation::S3BlobStorage::from_env(bucket, self.prefix.as_str()).await;
        Ok(Arc::new(storage))
    }

    #[cfg(not(feature = "s3"))]
    async fn s3_storage(&self) -> Result<Arc<dyn BlobStorage>> {
        bail!("s3 storage requires building with the `s3` feature")
    }

    /// Makes sure a signing key exists, generating a raw seed at
    /// `<keys-dir>/<signer>.key` when neither key file is present.
    pub fn ensure_signing_key(&self) -> Result<()> {
        let provider = FileKeyProvider::new(&self.keys_dir);
        let pem = provider.pem_key_path(&self.signer)?;
        let raw = provider.raw_key_path(&self.signer)?;

        if pem.exists() || raw.exists() {
            info!("Using signing key from {:?}", self.keys_dir);
            return Ok(());
        }

        info!("Generating new signing key at {:?}", raw);
        fs::create_dir_all(&self.keys_dir)
            .with_context(|| format!("Failed to create key directory {:?}", self.keys_dir))?;
        let material = KeyMaterial::generate_ed25519();
        fs::write(&raw, material.as_bytes()).context("Failed to write signing key")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&raw, fs::Permissions::from_mode(0o600))
                .context("Failed to restrict signing key permissions")?;
        }
        Ok(())
    }

    /// Composes the issuer and revocation store.
    pub async fn build_state(&self) -> Result<AppState> {
        let keys = CachedKeyProvider::new(FileKeyProvider::new(&self.keys_dir));
        let issuer = LicenseIssuer::new(Arc::new(keys), self.issuer_config());
        let revocations = RevocationStore::new(self.blob_storage().await?, self.revocation_config());
        info!(
            backend = revocations.backend_name(),
            path = %self.revocation_path,
            signer = %self.signer,
            "Service configured"
        );
        Ok(AppState {
            issuer,
            revocations,
        })
    }
}
