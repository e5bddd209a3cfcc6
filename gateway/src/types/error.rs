//! Universal error handling for the API

use std::borrow::Cow;

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::task::JoinError;

use crate::normalize::NormalizeError;
use crate::object_store::StoreError;

/// API error response body
///
/// Carries no internal detail; the underlying cause is only logged.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub message: Cow<'static, str>,
    /// Machine-readable error code
    pub code: Cow<'static, str>,
    /// Whether the client should retry the request
    pub allow_retry: bool,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(
        status: StatusCode,
        code: impl Into<Cow<'static, str>>,
        msg: impl Into<Cow<'static, str>>,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                message: msg.into(),
                code: code.into(),
                allow_retry: retry,
            },
        }
    }

    /// No image was supplied with the upload
    #[must_use]
    pub fn missing_input() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "missing_input",
            "An image file is required in the `image` field",
            false,
        )
    }

    /// Upload exceeds the configured size cap
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "Uploaded file exceeds the maximum allowed size",
            false,
        )
    }

    /// No route matches the request
    #[must_use]
    pub fn route_not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "route_not_found",
            "route not found",
            false,
        )
    }

    /// Request did not finish within the configured timeout
    #[must_use]
    pub fn request_timeout() -> Self {
        Self::new(
            StatusCode::REQUEST_TIMEOUT,
            "request_timeout",
            "Request timed out",
            true,
        )
    }

    /// Unexpected server-side failure
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
            false,
        )
    }

    /// HTTP status this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub fn code(&self) -> &str {
        &self.inner.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.code,
                self.inner.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.code,
                self.inner.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert normalization errors to application errors
impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        match &err {
            NormalizeError::Decode(msg) => {
                tracing::warn!("Image decode failed: {msg}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "decode_error",
                    "Uploaded file is not a readable image",
                    false,
                )
            }
            NormalizeError::Encode(msg) => {
                tracing::error!("Image encode failed: {msg}");
                Self::internal()
            }
        }
    }
}

/// Convert object store errors to application errors
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        use StoreError::{AwsError, ConfigError, S3Error, UpstreamError};

        match &err {
            UpstreamError(msg) => {
                tracing::error!("S3 upstream error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "Storage service temporarily unavailable",
                    true,
                )
            }
            S3Error(msg) | AwsError(msg) => {
                tracing::error!("S3/AWS error: {msg}");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "store_error",
                    "Storage service rejected the request",
                    false,
                )
            }
            ConfigError(msg) => {
                tracing::error!("Configuration error: {msg}");
                Self::internal()
            }
        }
    }
}

/// Convert failures of blocking tasks (panics, cancellation) to application errors
impl From<JoinError> for AppError {
    fn from(err: JoinError) -> Self {
        tracing::error!("Blocking task failed: {err}");
        Self::internal()
    }
}

/// Requests that are not `multipart/form-data` at all
impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        tracing::warn!("Multipart rejection: {err}");
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_multipart",
            "Expected a multipart/form-data body with an `image` field",
            false,
        )
    }
}

/// Errors while streaming multipart fields, including body limit hits
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::payload_too_large();
        }

        tracing::warn!("Malformed multipart body: {err}");
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_multipart",
            "Malformed multipart/form-data body",
            false,
        )
    }
}
