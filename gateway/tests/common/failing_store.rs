use std::time::Duration;

use async_trait::async_trait;
use gateway::object_store::{
    DeleteReceipt, ObjectStore, PutReceipt, SignedUrl, StoreError, StoreResult,
};

/// Object store whose every call fails with the same error
pub struct FailingObjectStore {
    make_error: fn() -> StoreError,
}

impl FailingObjectStore {
    pub fn new(make_error: fn() -> StoreError) -> Self {
        Self { make_error }
    }

    pub fn throttled() -> Self {
        Self::new(|| StoreError::UpstreamError("SlowDown (HTTP 503): Please reduce your request rate".to_string()))
    }

    pub fn access_denied() -> Self {
        Self::new(|| StoreError::S3Error("AccessDenied (HTTP 403): Access Denied".to_string()))
    }

    pub fn misconfigured() -> Self {
        Self::new(|| StoreError::ConfigError("presigned URL expiry out of range".to_string()))
    }
}

#[async_trait]
impl ObjectStore for FailingObjectStore {
    fn bucket(&self) -> &str {
        "failing-bucket"
    }

    async fn put(&self, _key: &str, _bytes: Vec<u8>, _content_type: &str) -> StoreResult<PutReceipt> {
        Err((self.make_error)())
    }

    async fn presign_get(&self, _key: &str, _expires_in: Duration) -> StoreResult<SignedUrl> {
        Err((self.make_error)())
    }

    async fn delete(&self, _key: &str) -> StoreResult<DeleteReceipt> {
        Err((self.make_error)())
    }
}

/// Object store whose calls never complete
pub struct StalledObjectStore;

#[async_trait]
impl ObjectStore for StalledObjectStore {
    fn bucket(&self) -> &str {
        "stalled-bucket"
    }

    async fn put(&self, _key: &str, _bytes: Vec<u8>, _content_type: &str) -> StoreResult<PutReceipt> {
        std::future::pending().await
    }

    async fn presign_get(&self, _key: &str, _expires_in: Duration) -> StoreResult<SignedUrl> {
        std::future::pending().await
    }

    async fn delete(&self, _key: &str) -> StoreResult<DeleteReceipt> {
        std::future::pending().await
    }
}
