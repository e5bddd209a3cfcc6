//! Object store access for stored images

#[cfg(feature = "test-utils")]
mod memory;

mod error;
mod s3;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use error::{StoreError, StoreResult};
#[cfg(feature = "test-utils")]
pub use memory::{InMemoryObjectStore, ResolveError};
pub use s3::S3ObjectStore;

/// Lifetime of read links handed out to clients
pub const READ_LINK_TTL: Duration = Duration::from_secs(3600);

/// An object held in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Object key, `<64 hex chars>-<file name>`
    pub key: String,
    /// Normalized image bytes
    pub bytes: Vec<u8>,
    /// MIME type recorded with the object
    pub content_type: String,
}

/// Store acknowledgement of a successful put
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutReceipt {
    /// Entity tag of the written object
    pub e_tag: Option<String>,
    /// Version id when the bucket is versioned
    pub version_id: Option<String>,
}

/// Store acknowledgement of a delete
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    /// Whether the delete produced a delete marker (versioned buckets)
    pub delete_marker: Option<bool>,
    /// Version id of the delete marker
    pub version_id: Option<String>,
}

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct SignedUrl {
    /// The presigned URL for GET operations
    pub url: String,
    /// UTC instant after which the URL is rejected
    pub expires_at: DateTime<Utc>,
}

/// Operations the gateway needs from a bucket
///
/// Implementations are shared across concurrent requests behind an `Arc` and
/// must not hold per-request state.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this store writes to
    fn bucket(&self) -> &str;

    /// Writes `bytes` at `key`, replacing any existing object
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the store rejects or fails the write
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<PutReceipt>;

    /// Produces a URL granting read access to `key` for `expires_in`
    ///
    /// The key is not checked for existence.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the URL cannot be signed
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<SignedUrl>;

    /// Removes the object at `key`; deleting a missing key succeeds
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the store rejects or fails the delete
    async fn delete(&self, key: &str) -> StoreResult<DeleteReceipt>;
}
