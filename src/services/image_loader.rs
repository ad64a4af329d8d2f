//! Upload decoding and downsampling.

use image::DynamicImage;
use kmeans_palette::PixelArray;

use crate::error::ApiError;

/// Decode an uploaded image and shrink it to fit within `size × size`.
///
/// Aspect ratio is preserved and images that already fit are left alone.
/// Alpha is dropped; channels are normalized to `0.0..=1.0`.
pub fn load_pixels(bytes: &[u8], size: u32) -> Result<PixelArray, ApiError> {
    let img = image::load_from_memory(bytes).map_err(|e| ApiError::ImageDecode(e.to_string()))?;
    tracing::debug!(
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "Decoded upload"
    );

    to_pixel_array(&downsample(img, size))
}

/// Fit `img` inside `size × size`, never upscaling.
pub fn downsample(img: DynamicImage, size: u32) -> DynamicImage {
    if img.width() <= size && img.height() <= size {
        return img;
    }
    img.thumbnail(size, size)
}

fn to_pixel_array(img: &DynamicImage) -> Result<PixelArray, ApiError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    PixelArray::from_rgb8(width as usize, height as usize, rgb.as_raw())
        .map_err(|e| ApiError::Internal(e.to_string()))
}
