//! S3 blob storage.
//!
//! The object's ETag is its version. Conditional writes use `PutObject` with
//! `If-Match` (replace) or `If-None-Match: *` (create); S3 answers a failed
//! precondition with 412, and a conflicting in-flight write with 409.

use crate::error::{StorageError, StorageResult};
use crate::storage::{validate_object_path, BlobStorage, ObjectVersion, VersionedBlob};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

/// S3-backed blob storage.
pub struct S3BlobStorage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3BlobStorage {
    /// Creates a store for `bucket`, placing objects under `prefix`.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Creates a store using credentials and region from the environment.
    pub async fn from_env(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, prefix)
    }

    fn key(&self, path: &str) -> StorageResult<String> {
        validate_object_path(path)?;
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            Ok(path.to_string())
        } else {
            Ok(format!("{prefix}/{path}"))
        }
    }
}

#[async_trait]
impl BlobStorage for S3BlobStorage {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn read(&self, path: &str) -> StorageResult<Option<VersionedBlob>> {
        let key = self.key(path)?;
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_key())
                {
                    return Ok(None);
                }
                return Err(StorageError::Backend(format!(
                    "GetObject {key} failed: {}",
                    DisplayErrorContext(&err)
                )));
            }
        };

        let version = output
            .e_tag()
            .map(ObjectVersion::new)
            .ok_or_else(|| StorageError::Backend(format!("GetObject {key}: missing ETag")))?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("GetObject {key} body: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(Some(VersionedBlob { data, version }))
    }

    async fn conditional_write(
        &self,
        path: &str,
        data: &[u8],
        expected: Option<&ObjectVersion>,
    ) -> StorageResult<ObjectVersion> {
        let key = self.key(path)?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(data.to_vec()));
        let request = match expected {
            Some(version) => request.if_match(version.as_str()),
            None => request.if_none_match("*"),
        };

        match request.send().await {
            Ok(output) => output
                .e_tag()
                .map(ObjectVersion::new)
                .ok_or_else(|| StorageError::Backend(format!("PutObject {key}: missing ETag"))),
            Err(err) => {
                let status = err.raw_response().map(|r| r.status().as_u16());
                if matches!(status, Some(409 | 412)) {
                    debug!(key, ?status, "Conditional PutObject rejected");
                    Err(StorageError::VersionMismatch {
                        path: path.to_string(),
                    })
                } else {
                    Err(StorageError::Backend(format!(
                        "PutObject {key} failed: {}",
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }
}
