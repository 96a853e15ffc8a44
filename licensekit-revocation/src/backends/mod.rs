//! Blob storage backends.

mod fs;
mod memory;
#[cfg(feature = "s3")]
mod s3;

pub use fs::FsBlobStorage;
pub use memory::MemoryBlobStorage;
#[cfg(feature = "s3")]
pub use s3::S3BlobStorage;
