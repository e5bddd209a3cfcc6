//! Error types for image normalization

use thiserror::Error;

/// Result type for normalization
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Errors that can occur while normalizing an uploaded image
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Input bytes could not be parsed as a supported image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Resized image could not be written back out
    #[error("Encode error: {0}")]
    Encode(String),
}
