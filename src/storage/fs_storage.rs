use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use super::ObjectStorage;
use crate::errors::AppError;

/// Stores objects as files under `root/{bucket}/{path}`.
pub struct FsObjectStorage {
    root: PathBuf,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn target(&self, bucket: &str, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(bucket).join(path);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(AppError::UploadFailed(format!("invalid object path {bucket}/{path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let target = self.target(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!("Failed to create {}: {e}", parent.display());
                AppError::UploadFailed(e.to_string())
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| {
                error!("Failed to create object {bucket}/{path}: {e}");
                if e.kind() == ErrorKind::AlreadyExists {
                    AppError::UploadFailed(format!("object {bucket}/{path} already exists"))
                } else {
                    AppError::UploadFailed(e.to_string())
                }
            })?;
        file.write_all(&bytes).await.map_err(|e| AppError::UploadFailed(e.to_string()))?;
        file.flush().await.map_err(|e| AppError::UploadFailed(e.to_string()))?;

        let absolute = tokio::fs::canonicalize(&target)
            .await
            .map_err(|e| AppError::UploadFailed(e.to_string()))?;
        debug!("Stored {} bytes at {}", bytes.len(), absolute.display());
        Ok(format!("file://{}", absolute.display()))
    }
}
