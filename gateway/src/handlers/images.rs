use std::borrow::Cow;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use validator::{Validate, ValidationError};

use crate::{
    keys,
    object_store::{DeleteReceipt, PutReceipt, READ_LINK_TTL},
    state::AppState,
    types::{AppError, ValidatedJson},
};

/// Multipart field carrying the upload
const IMAGE_FIELD: &str = "image";
/// S3 rejects keys longer than this
const MAX_KEY_BYTES: usize = 1024;

fn validate_image_name(name: &str) -> Result<(), ValidationError> {
    let invalid = name.is_empty()
        || name.len() > MAX_KEY_BYTES
        || name.starts_with('/')
        || name.contains('\\')
        || name.chars().any(char::is_control)
        || name.split('/').any(|segment| segment == "." || segment == "..");

    if invalid {
        Err(ValidationError::new("invalid_image_name")
            .with_message(Cow::Borrowed("imageName is not a valid object key")))
    } else {
        Ok(())
    }
}

/// Body of read-link and delete requests
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImageNameRequest {
    /// Object key returned by the upload endpoint
    #[validate(custom(function = "validate_image_name"))]
    pub image_name: String,
}

/// Response of a successful upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Store acknowledgement of the write
    pub file: PutReceipt,
    /// Object key of the stored image (not a URL)
    pub image_url: String,
    /// Human-readable status
    pub message: &'static str,
}

/// Response carrying a signed read link
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadLinkResponse {
    /// Presigned GET URL
    pub image_url: String,
    /// ISO-8601 UTC timestamp when the URL expires
    pub expires_at: String,
}

/// Response of a delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Human-readable status
    pub message: &'static str,
    /// Store acknowledgement of the delete
    pub result: DeleteReceipt,
}

struct ImageUpload {
    bytes: Bytes,
    file_name: String,
    content_type: Option<String>,
}

/// Pulls the `image` field out of the form, enforcing the size cap
async fn read_image_field(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<ImageUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field.bytes().await?;

        if bytes.is_empty() {
            return Err(AppError::missing_input());
        }
        if bytes.len() > max_upload_bytes {
            return Err(AppError::payload_too_large());
        }

        return Ok(ImageUpload {
            bytes,
            file_name,
            content_type,
        });
    }

    Err(AppError::missing_input())
}

/// Normalizes an uploaded image and stores it under a fresh random key
///
/// # Errors
///
/// - 400 when the `image` field is missing, empty or not a decodable image
/// - 413 when the upload exceeds the configured cap
/// - 502/503 when the object store fails
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_image_field(multipart?, state.max_upload_bytes).await?;

    debug!(
        "Received upload {:?} ({} bytes, {:?})",
        upload.file_name,
        upload.bytes.len(),
        upload.content_type
    );

    let normalizer = state.normalizer;
    let raw = upload.bytes;
    let hint = upload.content_type.clone().unwrap_or_default();
    let normalized =
        tokio::task::spawn_blocking(move || normalizer.normalize(&raw, &hint)).await??;

    let key = keys::generate(&upload.file_name);
    let content_type = upload
        .content_type
        .unwrap_or_else(|| normalized.mime_type().to_string());

    let receipt = state
        .store
        .put(&key, normalized.bytes, &content_type)
        .await?;

    info!("Stored image {} in bucket {}", key, state.store.bucket());

    Ok(Json(UploadResponse {
        file: receipt,
        image_url: key,
        message: "upload successful",
    }))
}

/// Issues a time-limited read link for a stored image
///
/// The key is not checked for existence; a link to a missing object fails
/// only when fetched.
///
/// # Errors
///
/// - 400 when `imageName` is missing or not a valid key
/// - 5xx when the link cannot be signed
#[instrument(skip(state, payload))]
pub async fn issue_read_link(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ImageNameRequest>,
) -> Result<Json<ReadLinkResponse>, AppError> {
    let signed = state
        .store
        .presign_get(&payload.image_name, READ_LINK_TTL)
        .await?;

    debug!(
        "Issued read link for {} expiring at {}",
        payload.image_name, signed.expires_at
    );

    Ok(Json(ReadLinkResponse {
        image_url: signed.url,
        expires_at: signed.expires_at.to_rfc3339(),
    }))
}

/// Deletes a stored image; deleting a missing key succeeds
///
/// # Errors
///
/// - 400 when `imageName` is missing or not a valid key
/// - 502/503 when the object store fails
#[instrument(skip(state, payload))]
pub async fn delete_image(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ImageNameRequest>,
) -> Result<Json<DeleteResponse>, AppError> {
    let result = state.store.delete(&payload.image_name).await?;

    info!("Deleted image {}", payload.image_name);

    Ok(Json(DeleteResponse {
        message: "Image deleted successfully",
        result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_valid_names() {
        assert!(validate_image_name(&keys::generate("cat.png")).is_ok());
        assert!(validate_image_name(&keys::generate("../../x.gif")).is_ok());
    }

    #[test]
    fn test_rejects_traversal_and_odd_keys() {
        for name in [
            "",
            "/absolute.png",
            "a/../b.png",
            "..",
            "./x.png",
            "back\\slash.png",
            "new\nline.png",
        ] {
            let err = validate_image_name(name).unwrap_err();
            assert_eq!(err.code, "invalid_image_name", "{name:?}");
        }
    }

    #[test]
    fn test_rejects_overlong_keys() {
        assert!(validate_image_name(&"a".repeat(MAX_KEY_BYTES)).is_ok());
        assert!(validate_image_name(&"a".repeat(MAX_KEY_BYTES + 1)).is_err());
    }

    #[test]
    fn test_accepts_nested_keys() {
        assert!(validate_image_name("folder/sub/cat.png").is_ok());
    }
}
