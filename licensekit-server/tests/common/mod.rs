//! Shared helpers for HTTP API tests.

#![allow(dead_code)]

use async_trait::async_trait;
use licensekit_license::{IssuerConfig, KeyMaterial, LicenseIssuer, StaticKeyProvider};
use licensekit_revocation::{
    BlobStorage, MemoryBlobStorage, ObjectVersion, RetryPolicy, RevocationConfig,
    RevocationStore, StorageError, StorageResult, VersionedBlob,
};
use licensekit_server::{build_router, AppState};
use std::sync::Arc;

pub const SIGNER: &str = "plugin";

pub fn test_issuer() -> LicenseIssuer {
    let keys = StaticKeyProvider::new().with_key(SIGNER, KeyMaterial::new((1..=32).collect()));
    LicenseIssuer::new(Arc::new(keys), IssuerConfig::default())
}

/// An issuer whose provider has no keys at all.
pub fn keyless_issuer() -> LicenseIssuer {
    LicenseIssuer::new(Arc::new(StaticKeyProvider::new()), IssuerConfig::default())
}

pub fn store_over(storage: Arc<dyn BlobStorage>) -> RevocationStore {
    RevocationStore::new(
        storage,
        RevocationConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff_ms: 1,
                max_backoff_ms: 2,
            },
            ..RevocationConfig::default()
        },
    )
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
pub async fn spawn_server(state: AppState) -> String {
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

/// Default server: static key, in-memory record.
pub async fn spawn_test_server() -> (String, Arc<MemoryBlobStorage>) {
    let storage = Arc::new(MemoryBlobStorage::new());
    let base = spawn_server(AppState {
        issuer: test_issuer(),
        revocations: store_over(storage.clone()),
    })
    .await;
    (base, storage)
}

/// Rejects every write with a version mismatch.
pub struct ContendedStorage;

#[async_trait]
impl BlobStorage for ContendedStorage {
    fn backend_name(&self) -> &'static str {
        "contended"
    }

    async fn read(&self, _path: &str) -> StorageResult<Option<VersionedBlob>> {
        Ok(None)
    }

    async fn conditional_write(
        &self,
        path: &str,
        _data: &[u8],
        _expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        Err(StorageError::VersionMismatch {
            path: path.to_string(),
        })
    }
}

/// Fails every operation with a backend error.
pub struct BrokenStorage;

#[async_trait]
impl BlobStorage for BrokenStorage {
    fn backend_name(&self) -> &'static str {
        "broken"
    }

    async fn read(&self, _path: &str) -> StorageResult<Option<VersionedBlob>> {
        Err(StorageError::Backend("bucket unreachable".to_string()))
    }

    async fn conditional_write(
        &self,
        _path: &str,
        _data: &[u8],
        _expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        Err(StorageError::Backend("bucket unreachable".to_string()))
    }
}
