//! Revocation record for licensekit.
//!
//! The record is a single shared blob holding the set of revoked license IDs.
//! Storage backends offer no append and no locking, only read, conditional
//! write, and a version token that changes on every write. Every mutation
//! goes through [`RevocationStore::revoke`], which reads the record, adds the
//! ID and installs the result with a compare-and-swap, retrying with backoff
//! when another writer got there first.
//!
//! # Record Format
//!
//! ```json
//! {"format":1,"revoked":["0f6c1a52-…","abc123"]}
//! ```
//!
//! IDs are kept sorted. The legacy newline-delimited text form is still
//! accepted on read and replaced by JSON on the next write.

mod backends;
mod error;
mod record;
mod storage;
mod store;

pub use backends::{FsBlobStorage, MemoryBlobStorage};
#[cfg(feature = "s3")]
pub use backends::S3BlobStorage;
pub use error::{RevocationError, RevocationResult, StorageError, StorageResult};
pub use record::{RevocationRecord, RECORD_FORMAT};
pub use storage::{validate_object_path, BlobStorage, ObjectVersion, VersionedBlob};
pub use store::{
    RetryPolicy, RevocationConfig, RevocationStore, RevokeOutcome, DEFAULT_RECORD_PATH,
};
