use bytes::Bytes;

/// An image received on `POST /api/images`, alive for the request only.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub file_name: String,
}

/// What the media store hands back after an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

/// Result of a completed upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImageRef {
    pub id: String,
    pub url: String,
    pub original_name: String,
}
