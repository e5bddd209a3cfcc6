//! Error types for object store operations

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfigError;
use thiserror::Error;

/// Result type for object store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error codes S3 uses when a caller is being rate limited
const THROTTLING_CODES: [&str; 5] = [
    "SlowDown",
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequests",
];

/// Errors that can occur during object store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// S3 rejected the request (auth, missing bucket, bad request)
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// AWS SDK error while building the request or reading the response
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upstream service error (5xx, throttling, timeouts, connection failures)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),
}

impl StoreError {
    /// Whether the caller may retry the same request
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamError(_))
    }
}

impl<E> From<SdkError<E>> for StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    fn from(error: SdkError<E>) -> Self {
        match &error {
            SdkError::ServiceError(service_err) => {
                let status = service_err.raw().status().as_u16();
                let err = service_err.err();
                let code = err.code().unwrap_or("Unknown");
                let detail = format!(
                    "{code} (HTTP {status}): {}",
                    err.message().unwrap_or("no message")
                );

                if status >= 500 || THROTTLING_CODES.contains(&code) {
                    Self::UpstreamError(detail)
                } else {
                    Self::S3Error(detail)
                }
            }
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
                Self::UpstreamError(DisplayErrorContext(&error).to_string())
            }
            _ => Self::AwsError(DisplayErrorContext(&error).to_string()),
        }
    }
}

impl From<PresigningConfigError> for StoreError {
    fn from(error: PresigningConfigError) -> Self {
        Self::ConfigError(format!("Failed to create presigning config: {error}"))
    }
}
