//! Small JPEG previews of uploaded meal photos. The original upload is never
//! stored; only this artifact is.

use image::{codecs::jpeg::JpegEncoder, GenericImageView};

/// Neither side of a thumbnail exceeds this many pixels.
pub const MAX_DIMENSION: u32 = 300;
pub const JPEG_QUALITY: u8 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),
}

/// Decodes `original`, shrinks it to fit in a 300x300 box (aspect ratio kept,
/// never upscaled) and re-encodes it as JPEG.
pub fn make_thumbnail(original: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
    let img = image::load_from_memory(original).map_err(ThumbnailError::Decode)?;
    let (width, height) = img.dimensions();
    let img = if width > MAX_DIMENSION || height > MAX_DIMENSION {
        img.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
        img
    };

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&img.to_rgb8())
        .map_err(ThumbnailError::Encode)?;
    Ok(out)
}
