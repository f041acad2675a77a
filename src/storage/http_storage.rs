use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use super::ObjectStorage;
use crate::errors::AppError;

const CACHE_CONTROL_SECS: u32 = 3600;

/// Supabase-style storage REST API.
///
/// Uploads go to `POST {base}/storage/v1/object/{bucket}/{path}` with
/// `x-upsert: false`; the public URL is
/// `{base}/storage/v1/object/public/{bucket}/{path}`.
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpObjectStorage {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn upload_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let size = bytes.len();
        let response = self
            .client
            .post(self.upload_url(bucket, path))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("x-upsert", "false")
            .header("cache-control", format!("max-age={CACHE_CONTROL_SECS}"))
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                error!("Upload of {bucket}/{path} failed: {e}");
                AppError::UploadFailed(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Storage rejected {bucket}/{path} ({status}): {body}");
            return Err(AppError::UploadFailed(format!("storage returned {status}")));
        }

        debug!("Uploaded {size} bytes to {bucket}/{path}");
        Ok(self.public_url(bucket, path))
    }
}
