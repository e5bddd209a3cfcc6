//! Image gateway: normalizes uploaded images into S3 and hands out signed read links

#![deny(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]

/// HTTP handlers and routes
pub mod handlers;

/// Object key generation
pub mod keys;

/// Image normalization
pub mod normalize;

/// Object store access
pub mod object_store;

/// Server setup and lifecycle
pub mod server;

/// Application state
pub mod state;

/// Configuration, errors and extractors
pub mod types;
