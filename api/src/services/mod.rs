pub mod cloudinary;
pub mod image_processor;
pub mod remove_bg;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::{MediaStoreError, RemoveBgError},
    models::server_models::StoredImage,
};

/// Step one of the upload pipeline.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image: Bytes) -> Result<Bytes, RemoveBgError>;
}

/// CDN-backed storage for processed images.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `image` under a key derived from `file_name`.
    async fn upload(&self, image: Bytes, file_name: &str) -> Result<StoredImage, MediaStoreError>;

    /// Removes `public_id`; an unknown id is not an error.
    async fn delete(&self, public_id: &str) -> Result<(), MediaStoreError>;
}
