use std::io::Cursor;

use bytes::Bytes;
use image::{ImageFormat, ImageReader};

use crate::error::TransformError;

pub const OUTPUT_FORMAT: ImageFormat = ImageFormat::Png;
pub const OUTPUT_CONTENT_TYPE: &str = "image/png";

/// Mirrors an image across its vertical axis and re-encodes it as PNG,
/// whatever the input format was.
pub fn flip_horizontal(input: &[u8]) -> Result<Bytes, TransformError> {
    let source = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|err| TransformError::Decode(err.into()))?
        .decode()
        .map_err(TransformError::Decode)?;

    let flipped = source.fliph();

    let mut output: Vec<u8> = Vec::new();
    flipped
        .write_to(&mut Cursor::new(&mut output), OUTPUT_FORMAT)
        .map_err(TransformError::Encode)?;

    Ok(Bytes::from(output))
}

/// Runs [`flip_horizontal`] on the blocking pool so decoding doesn't stall the runtime.
pub async fn flip_horizontal_blocking(input: Bytes) -> Result<Bytes, TransformError> {
    tokio::task::spawn_blocking(move || flip_horizontal(&input))
        .await
        .map_err(|err| TransformError::Aborted(err.to_string()))?
}
