use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use http::StatusCode;

use crate::{
    error::ApiError,
    models::{
        api_models::{ApiResponse, UploadImageResponse},
        server_models::{ProcessedImageRef, UploadRequest},
    },
    services::image_processor::flip_horizontal_blocking,
    utils::upload::{read_image_field, NO_FILE_PROVIDED},
    ServerConfig,
};

const PROCESS_FAILED: &str = "Failed to process image";

pub async fn upload_image(
    State(server_config): State<ServerConfig>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UploadImageResponse>>), ApiError> {
    let upload = read_image_field(multipart)
        .await?
        .ok_or_else(|| ApiError::Validation(NO_FILE_PROVIDED.to_string()))?;

    let processed = process_image(&server_config, upload)
        .await
        .map_err(|err| err.with_fallback(PROCESS_FAILED))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UploadImageResponse {
            id: processed.id,
            url: processed.url,
            original_name: processed.original_name,
        })),
    ))
}

/// Background removal, then flip, then storage. The first failure ends the pipeline.
pub async fn process_image(
    server_config: &ServerConfig,
    upload: UploadRequest,
) -> Result<ProcessedImageRef, ApiError> {
    let UploadRequest { data, file_name } = upload;

    let without_background = server_config
        .background_remover
        .remove_background(data)
        .await?;
    tracing::debug!(file_name = %file_name, size = without_background.len(), "background removed");

    let flipped = flip_horizontal_blocking(without_background).await?;
    tracing::debug!(file_name = %file_name, size = flipped.len(), "image flipped");

    let stored = server_config.media_store.upload(flipped, &file_name).await?;

    Ok(ProcessedImageRef {
        id: stored.public_id,
        url: stored.url,
        original_name: file_name,
    })
}
