use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use thiserror::Error;

use crate::models::api_models::ApiResponse;

/// Failures of the background-removal client.
#[derive(Debug, Error)]
pub enum RemoveBgError {
    #[error("CLIPDROP_API_KEY is not configured")]
    NotConfigured,

    /// Non-success status; carries the upstream message or the generic fallback.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to decode image: {0}")]
    Decode(image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("Image transform aborted: {0}")]
    Aborted(String),
}

/// Failures of the media store client.
#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("Cloudinary credentials are not configured")]
    NotConfigured,

    #[error("Unsupported signature algorithm: {0}")]
    InvalidSignatureAlgorithm(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Upload failed with no result")]
    NoResult,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// Everything a handler can fail with. Rendered as an `ApiResponse` error body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Too many requests, please try again later")]
    RateLimited,

    #[error(transparent)]
    RemoveBg(#[from] RemoveBgError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    MediaStore(#[from] MediaStoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(..) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(..) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RemoveBg(..)
            | ApiError::Transform(..)
            | ApiError::MediaStore(..)
            | ApiError::Internal(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Replaces a failure that carries no text with the operation's generic message.
    pub fn with_fallback(self, fallback: &str) -> Self {
        if self.to_string().trim().is_empty() {
            ApiError::Internal(fallback.to_string())
        } else {
            self
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "request failed");
        } else {
            tracing::warn!(status = %status, error = %message, "request rejected");
        }

        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}
