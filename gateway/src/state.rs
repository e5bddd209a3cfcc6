//! Application state management

use std::sync::Arc;

use crate::normalize::ImageNormalizer;
use crate::object_store::ObjectStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Object store client, shared by all requests
    pub store: Arc<dyn ObjectStore>,
    /// Bounding-box normalizer applied to uploads
    pub normalizer: ImageNormalizer,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Creates state with the default 1080x1920 normalizer
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            normalizer: ImageNormalizer::default(),
            max_upload_bytes,
        }
    }
}
