use axum::{
    extract::{RawPathParams, State},
    Json,
};

use crate::{
    error::ApiError,
    models::api_models::{ApiResponse, DeleteImageResponse},
    ServerConfig,
};

const DELETE_FAILED: &str = "Failed to delete image";
const IMAGE_DELETED: &str = "Image deleted successfully";

/// Percent-decodes the raw `:id` segment exactly once.
pub fn decode_image_id(raw: &str) -> Result<String, ApiError> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| ApiError::Validation("Image ID is malformed".to_string()))?;

    if decoded.is_empty() {
        return Err(ApiError::Validation("Image ID is required".to_string()));
    }
    Ok(decoded.into_owned())
}

pub async fn delete_image(
    State(server_config): State<ServerConfig>,
    params: RawPathParams,
) -> Result<Json<ApiResponse<DeleteImageResponse>>, ApiError> {
    let raw_id = params
        .iter()
        .find(|(key, _)| *key == "id")
        .map(|(_, value)| value)
        .unwrap_or_default();
    let public_id = decode_image_id(raw_id)?;

    server_config
        .media_store
        .delete(&public_id)
        .await
        .map_err(|err| ApiError::from(err).with_fallback(DELETE_FAILED))?;

    tracing::info!(public_id = %public_id, "delete request completed");
    Ok(Json(ApiResponse::ok(DeleteImageResponse {
        message: IMAGE_DELETED.to_string(),
    })))
}
