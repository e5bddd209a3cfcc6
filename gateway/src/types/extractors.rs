//! Custom extractors for request validation

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::types::error::AppError;

/// Custom JSON extractor that validates the payload
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // First extract JSON
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| {
                tracing::warn!("JSON rejection: {err}");
                match err {
                    JsonRejection::MissingJsonContentType(_) => AppError::new(
                        StatusCode::BAD_REQUEST,
                        "invalid_content_type",
                        "Missing Content-Type: application/json header",
                        false,
                    ),
                    _ => AppError::new(
                        StatusCode::BAD_REQUEST,
                        "invalid_json",
                        "Invalid JSON payload",
                        false,
                    ),
                }
            })?;

        // Then validate
        payload.validate().map_err(|errors| {
            // The first field error carries the error code and message
            errors
                .field_errors()
                .into_values()
                .find_map(|field_errors| field_errors.first().cloned())
                .map_or_else(
                    || {
                        AppError::new(
                            StatusCode::BAD_REQUEST,
                            "validation_error",
                            "Request validation failed",
                            false,
                        )
                    },
                    |error| {
                        AppError::new(
                            StatusCode::BAD_REQUEST,
                            error.code,
                            error
                                .message
                                .unwrap_or(std::borrow::Cow::Borrowed("Request validation failed")),
                            false,
                        )
                    },
                )
        })?;

        Ok(Self(payload))
    }
}
