//! In-memory doubles for the external services, shared by the handler tests.

use std::{
    io::Cursor,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use http::HeaderValue;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::{
    app,
    error::{MediaStoreError, RemoveBgError},
    models::server_models::StoredImage,
    services::{BackgroundRemover, MediaStore},
    utils::public_id::strip_extension,
    RouterOptions, ServerConfig,
};

/// A small valid PNG with transparency.
pub fn png_bytes() -> Vec<u8> {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 1, Rgba([0, 255, 0, 0]));

    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

enum RemoverBehaviour {
    Return(Bytes),
    Fail(String),
    Unconfigured,
}

pub struct MockBackgroundRemover {
    behaviour: RemoverBehaviour,
    pub calls: Arc<AtomicUsize>,
}

impl MockBackgroundRemover {
    fn with(behaviour: RemoverBehaviour) -> Self {
        Self {
            behaviour,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn returning(data: Vec<u8>) -> Self {
        Self::with(RemoverBehaviour::Return(Bytes::from(data)))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(RemoverBehaviour::Fail(message.to_string()))
    }

    pub fn unconfigured() -> Self {
        Self::with(RemoverBehaviour::Unconfigured)
    }
}

#[async_trait]
impl BackgroundRemover for MockBackgroundRemover {
    async fn remove_background(&self, _image: Bytes) -> Result<Bytes, RemoveBgError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            RemoverBehaviour::Return(data) => Ok(data.clone()),
            RemoverBehaviour::Fail(message) => Err(RemoveBgError::Upstream(message.clone())),
            RemoverBehaviour::Unconfigured => Err(RemoveBgError::NotConfigured),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum DeleteOutcome {
    #[default]
    Deleted,
    NotFound,
    Fail(String),
}

/// Records uploads and deletes. Uploads answer with a Cloudinary-shaped id.
#[derive(Default)]
pub struct MockMediaStore {
    upload_error: Option<String>,
    delete_outcome: DeleteOutcome,
    uploads: Mutex<Vec<(Bytes, String)>>,
    deleted: Mutex<Vec<String>>,
}

impl MockMediaStore {
    pub fn failing(message: &str) -> Self {
        Self {
            upload_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delete_outcome(delete_outcome: DeleteOutcome) -> Self {
        Self {
            delete_outcome,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<(Bytes, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(&self, image: Bytes, file_name: &str) -> Result<StoredImage, MediaStoreError> {
        if let Some(message) = &self.upload_error {
            return Err(MediaStoreError::Upstream(message.clone()));
        }
        self.uploads.lock().unwrap().push((image, file_name.to_string()));

        let stem = strip_extension(file_name);
        Ok(StoredImage {
            url: format!("https://res.cloudinary.com/test-cloud/processed_123_{stem}.png"),
            public_id: format!("image-transformation/processed_123_{stem}"),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaStoreError> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        match &self.delete_outcome {
            DeleteOutcome::Deleted | DeleteOutcome::NotFound => Ok(()),
            DeleteOutcome::Fail(message) => Err(MediaStoreError::Upstream(message.clone())),
        }
    }
}

pub fn test_server_config(remover: MockBackgroundRemover, store: Arc<MockMediaStore>) -> ServerConfig {
    ServerConfig {
        background_remover: Arc::new(remover),
        media_store: store,
    }
}

/// The full router with rate limiting off.
pub fn test_app(remover: MockBackgroundRemover, store: Arc<MockMediaStore>) -> Router {
    app(
        test_server_config(remover, store),
        RouterOptions {
            allowed_origin: HeaderValue::from_static("http://localhost:5173"),
            rate_limit_per_minute: None,
        },
    )
}
