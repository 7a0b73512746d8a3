pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

use std::{any::Any, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use http::{header, HeaderValue, Method, StatusCode};
use reqwest::Client;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use config::EnvVars;
use error::MediaStoreError;
use models::api_models::ApiResponse;
use routes::{delete_image::delete_image, health::health, upload_image::upload_image};
use services::{
    cloudinary::CloudinaryClient, remove_bg::ClipdropClient, BackgroundRemover, MediaStore,
};
use utils::{
    rate_limit::{client_rate_limiter, limit_by_client_ip, spawn_limiter_cleanup},
    upload::MAX_BODY_SIZE,
};

/// Handler state: the two external-service clients, built once at startup.
#[derive(Clone)]
pub struct ServerConfig {
    pub background_remover: Arc<dyn BackgroundRemover>,
    pub media_store: Arc<dyn MediaStore>,
}

impl ServerConfig {
    /// Builds the production clients. Fails when the Cloudinary credentials are
    /// incomplete; the Clipdrop key is only checked when an image is processed.
    pub fn from_env_vars(envs: &EnvVars) -> Result<Self, MediaStoreError> {
        let credentials = envs.cloudinary_credentials()?;
        let signature_algorithm = envs.signature_algorithm()?;
        let http_client = Client::new();

        let media_store = CloudinaryClient::new(
            http_client.clone(),
            &envs.cloudinary_api_url,
            credentials,
            signature_algorithm,
        );
        let background_remover = ClipdropClient::new(
            http_client,
            envs.clipdrop_api_url.clone(),
            envs.clipdrop_api_key.clone(),
        );

        Ok(ServerConfig {
            background_remover: Arc::new(background_remover),
            media_store: Arc::new(media_store),
        })
    }
}

/// Router-level settings that do not belong to handler state.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub allowed_origin: HeaderValue,
    pub rate_limit_per_minute: Option<u32>,
}

impl RouterOptions {
    pub fn from_env_vars(envs: &EnvVars) -> Result<Self, http::header::InvalidHeaderValue> {
        Ok(RouterOptions {
            allowed_origin: HeaderValue::from_str(&envs.frontend_url)?,
            rate_limit_per_minute: envs.rate_limit_enabled.then_some(envs.rate_limit_per_minute),
        })
    }
}

pub fn app(server_config: ServerConfig, options: RouterOptions) -> Router {
    let mut images = Router::new()
        .route("/api/images", post(upload_image))
        .route("/api/images/:id", delete(delete_image))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    if let Some(per_minute) = options.rate_limit_per_minute {
        let limiter = client_rate_limiter(per_minute);
        spawn_limiter_cleanup(limiter.clone());
        images = images.route_layer(middleware::from_fn_with_state(limiter, limit_by_client_ip));
    }

    let cors = CorsLayer::new()
        .allow_origin(options.allowed_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(images)
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(server_config)
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "unhandled error");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::err("Internal server error")),
    )
        .into_response()
}
