//! Output types for the quantization pipeline.
//!
//! [`QuantizedImage`] keeps labels canonical and reconstructs pixels on
//! demand, so callers can inspect the palette without paying for a full
//! pixel buffer.

mod quantized_image;

pub use quantized_image::QuantizedImage;
