//! Pixel grid type shared by every pipeline stage.

use crate::error::QuantizeError;

/// A `width × height × depth` grid of channel values in row-major order.
///
/// Pixel `i` lives at `data[i * depth..(i + 1) * depth]` where
/// `i = y * width + x`. The channel range is whatever the caller chose;
/// [`PixelArray::from_rgb8`] normalizes to `0.0..=1.0`.
///
/// # Example
///
/// ```
/// use kmeans_palette::PixelArray;
///
/// let pixels = PixelArray::from_rgb8(2, 1, &[255, 0, 0, 0, 0, 255]).unwrap();
/// assert_eq!(pixels.len(), 2);
/// assert_eq!(pixels.pixel(1), &[0.0, 0.0, 1.0]);
/// assert_eq!(pixels.to_rgb8(), vec![255, 0, 0, 0, 0, 255]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PixelArray {
    width: usize,
    height: usize,
    depth: usize,
    data: Vec<f32>,
}

impl PixelArray {
    /// Wrap flat channel data.
    ///
    /// # Errors
    ///
    /// - [`QuantizeError::InvalidParameter`] if `depth` is zero
    /// - [`QuantizeError::ShapeMismatch`] if `data.len() != width * height * depth`
    pub fn new(
        width: usize,
        height: usize,
        depth: usize,
        data: Vec<f32>,
    ) -> Result<Self, QuantizeError> {
        if depth == 0 {
            return Err(QuantizeError::InvalidParameter {
                name: "depth",
                value: depth,
                reason: "must be at least 1",
            });
        }
        let expected = width * height * depth;
        if data.len() != expected {
            return Err(QuantizeError::ShapeMismatch {
                what: "pixel data",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            data,
        })
    }

    /// Build a 3-channel array from packed `[R, G, B, ...]` bytes, scaled to `0.0..=1.0`.
    pub fn from_rgb8(width: usize, height: usize, rgb: &[u8]) -> Result<Self, QuantizeError> {
        let data = rgb.iter().map(|&v| f32::from(v) / 255.0).collect();
        Self::new(width, height, 3, data)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Channels per pixel.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of pixels (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel values of the pixel at row-major index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn pixel(&self, i: usize) -> &[f32] {
        &self.data[i * self.depth..(i + 1) * self.depth]
    }

    /// Iterate pixels in row-major order.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.depth)
    }

    /// The flat channel buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Convert `0.0..=1.0` channels back to bytes, rounding and clamping.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| channel_to_u8(v)).collect()
    }
}

/// Scale a normalized channel to a byte.
#[inline]
pub(crate) fn channel_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
