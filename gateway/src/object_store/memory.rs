//! Process-local object store with verifiable signed URLs

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use thiserror::Error;
use url::Url;

use super::{
    DeleteReceipt, ObjectStore, PutReceipt, SignedUrl, StoreError, StoreResult, StoredImage,
};
use crate::keys;

type HmacSha256 = Hmac<Sha256>;

const EXPIRES_PARAM: &str = "X-Amz-Expires";
const DATE_PARAM: &str = "X-Amz-Date";
const SIGNATURE_PARAM: &str = "X-Amz-Signature";

/// Bytes escaped when a key becomes a URL path; `/` keeps nested keys readable
const KEY_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Reasons a signed URL does not resolve to an object
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// URL is not one this store issued
    #[error("Malformed signed URL: {0}")]
    Malformed(String),

    /// Signature does not match the URL contents
    #[error("Signature mismatch")]
    BadSignature,

    /// URL was valid but its lifetime has passed
    #[error("Signed URL expired at {0}")]
    Expired(DateTime<Utc>),

    /// Signature is valid but nothing is stored at the key
    #[error("No object at {0}")]
    NotFound(String),
}

/// Object store kept in memory, for tests and local runs
///
/// Signed URLs carry an HMAC over the bucket, object key, issue time and
/// lifetime, so [`InMemoryObjectStore::resolve`] can check them the way S3
/// would.
pub struct InMemoryObjectStore {
    bucket_name: String,
    base_url: Url,
    signer: HmacSha256,
    objects: RwLock<HashMap<String, StoredImage>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store for `bucket_name` with a fresh signing key
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConfigError` if the bucket name cannot form a host name
    pub fn new(bucket_name: impl Into<String>) -> StoreResult<Self> {
        let bucket_name = bucket_name.into();
        let base_url = Url::parse(&format!("https://{bucket_name}.s3.memory.localhost/"))
            .map_err(|e| StoreError::ConfigError(format!("Invalid bucket name: {e}")))?;

        let signer = HmacSha256::new_from_slice(keys::random_hex(32).as_bytes())
            .map_err(|e| StoreError::ConfigError(format!("Invalid signing key: {e}")))?;

        Ok(Self {
            bucket_name,
            base_url,
            signer,
            objects: RwLock::new(HashMap::new()),
        })
    }

    /// Returns a copy of the object at `key`, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredImage> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no objects
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dereferences a signed URL as if it were fetched at instant `at`
    ///
    /// # Errors
    ///
    /// Returns a `ResolveError` when the URL is foreign, tampered with, expired,
    /// or points at a missing object
    pub fn resolve(&self, signed_url: &str, at: DateTime<Utc>) -> Result<StoredImage, ResolveError> {
        let url = Url::parse(signed_url).map_err(|e| ResolveError::Malformed(e.to_string()))?;

        if url.host_str() != self.base_url.host_str() {
            return Err(ResolveError::Malformed(format!(
                "unexpected host {:?}",
                url.host_str()
            )));
        }

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let param = |name: &str| {
            query
                .get(name)
                .ok_or_else(|| ResolveError::Malformed(format!("missing {name}")))
        };

        let expires_secs: u64 = param(EXPIRES_PARAM)?
            .parse()
            .map_err(|_| ResolveError::Malformed(format!("invalid {EXPIRES_PARAM}")))?;
        let issued_secs: i64 = param(DATE_PARAM)?
            .parse()
            .map_err(|_| ResolveError::Malformed(format!("invalid {DATE_PARAM}")))?;
        let signature = hex::decode(param(SIGNATURE_PARAM)?)
            .map_err(|_| ResolveError::Malformed(format!("invalid {SIGNATURE_PARAM}")))?;

        let path = url.path();
        let key = percent_decode_str(path.strip_prefix('/').unwrap_or(path))
            .decode_utf8()
            .map_err(|e| ResolveError::Malformed(format!("invalid object path: {e}")))?;

        self.mac(&key, issued_secs, expires_secs)
            .verify_slice(&signature)
            .map_err(|_| ResolveError::BadSignature)?;

        let issued_at = Utc
            .timestamp_opt(issued_secs, 0)
            .single()
            .ok_or_else(|| ResolveError::Malformed(format!("invalid {DATE_PARAM}")))?;
        let expires_at = issued_at + Duration::from_secs(expires_secs);
        if at > expires_at {
            return Err(ResolveError::Expired(expires_at));
        }

        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&*key)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(key.into_owned()))
    }

    fn object_url(&self, key: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&utf8_percent_encode(key, KEY_PATH).to_string());
        url
    }

    fn mac(&self, key: &str, issued_secs: i64, expires_secs: u64) -> HmacSha256 {
        let mut mac = self.signer.clone();
        mac.update(
            format!(
                "{}\n{}\n{}\n{}",
                self.bucket_name, key, issued_secs, expires_secs
            )
            .as_bytes(),
        );
        mac
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<PutReceipt> {
        let e_tag = format!("\"{}\"", keys::random_hex(16));
        let image = StoredImage {
            key: key.to_string(),
            bytes,
            content_type: content_type.to_string(),
        };

        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), image);

        Ok(PutReceipt {
            e_tag: Some(e_tag),
            version_id: None,
        })
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StoreResult<SignedUrl> {
        let issued_at = Utc::now();
        let issued_secs = issued_at.timestamp();
        let expires_secs = expires_in.as_secs();

        let mut url = self.object_url(key);
        let signature = hex::encode(
            self.mac(key, issued_secs, expires_secs)
                .finalize()
                .into_bytes(),
        );

        url.query_pairs_mut()
            .append_pair(EXPIRES_PARAM, &expires_secs.to_string())
            .append_pair(DATE_PARAM, &issued_secs.to_string())
            .append_pair(SIGNATURE_PARAM, &signature);

        let expires_at = Utc
            .timestamp_opt(issued_secs, 0)
            .single()
            .unwrap_or(issued_at)
            + expires_in;

        Ok(SignedUrl {
            url: url.to_string(),
            expires_at,
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<DeleteReceipt> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        Ok(DeleteReceipt::default())
    }
}
