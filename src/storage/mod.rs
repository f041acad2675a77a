//! Binary object storage for user-uploaded media.

pub mod fs_storage;
pub mod http_storage;
pub mod paths;

use async_trait::async_trait;

use crate::errors::AppError;

pub use fs_storage::FsObjectStorage;
pub use http_storage::HttpObjectStorage;
pub use paths::{media_object_path, MediaKind};

/// Write-once blob store that hands back a publicly retrievable URL.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` at `bucket/path`. An existing object at that path is
    /// never overwritten; the call fails with [`AppError::UploadFailed`].
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;
}
