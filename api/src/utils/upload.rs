use axum::extract::{multipart::MultipartRejection, Multipart};
use http::StatusCode;

use crate::{error::ApiError, models::server_models::UploadRequest};

pub const IMAGE_FIELD: &str = "image";
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
/// Request body cap: the file plus room for multipart framing and other fields.
pub const MAX_BODY_SIZE: usize = MAX_FILE_SIZE + 1024 * 1024;

pub const NO_FILE_PROVIDED: &str = "No image file provided";
pub const INVALID_FILE_TYPE: &str = "Invalid file type. Only JPEG, PNG, and WebP are allowed.";
pub const FILE_TOO_LARGE: &str = "File too large";

/// Pulls the `image` file out of a multipart body.
///
/// Returns `Ok(None)` when no file was attached, including bodies that are not
/// multipart at all. Parts without a file name are plain form fields and are
/// skipped, as are fields with other names.
pub async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<UploadRequest>, ApiError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "request is not multipart");
            return Ok(None);
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let content_type = field.content_type().unwrap_or_default().to_owned();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            tracing::warn!(content_type = %content_type, file_name = %file_name, "rejected upload");
            return Err(ApiError::Validation(INVALID_FILE_TYPE.to_string()));
        }

        let data = field.bytes().await.map_err(multipart_error)?;
        if data.len() > MAX_FILE_SIZE {
            return Err(ApiError::PayloadTooLarge(FILE_TOO_LARGE.to_string()));
        }

        tracing::info!(file_name = %file_name, size = data.len(), "received image");
        return Ok(Some(UploadRequest { data, file_name }));
    }

    Ok(None)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(FILE_TOO_LARGE.to_string())
    } else {
        ApiError::Validation(err.body_text())
    }
}
