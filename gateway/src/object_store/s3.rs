//! S3-backed object store

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream, Client as S3Client};
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use super::{DeleteReceipt, ObjectStore, PutReceipt, SignedUrl, StoreError, StoreResult};

/// Image storage client for S3 operations
pub struct S3ObjectStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl S3ObjectStore {
    /// Creates a new S3 object store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket holding the images
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<PutReceipt> {
        debug!("Putting object: {} ({} bytes, {})", key, bytes.len(), content_type);

        let output = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let err = StoreError::from(e);
                error!("Failed to put object {}: {}", key, err);
                err
            })?;

        Ok(PutReceipt {
            e_tag: output.e_tag().map(ToString::to_string),
            version_id: output.version_id().map(ToString::to_string),
        })
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<SignedUrl> {
        debug!(
            "Generating presigned GET URL for object: {} valid for {}s",
            key,
            expires_in.as_secs()
        );

        let presigned_config = PresigningConfig::expires_in(expires_in)?;

        let presigned_request = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigned_config)
            .await
            .map_err(|e| {
                let err = StoreError::from(e);
                error!("Failed to presign object {}: {}", key, err);
                err
            })?;

        let expires_at: DateTime<Utc> = Utc::now() + expires_in;

        debug!(
            "Generated presigned URL for object: {} expires at: {}",
            key, expires_at
        );

        Ok(SignedUrl {
            url: presigned_request.uri().to_string(),
            expires_at,
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteReceipt> {
        debug!("Deleting object: {}", key);

        let output = self
            .s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err = StoreError::from(e);
                error!("Failed to delete object {}: {}", key, err);
                err
            })?;

        Ok(DeleteReceipt {
            delete_marker: output.delete_marker(),
            version_id: output.version_id().map(ToString::to_string),
        })
    }
}
