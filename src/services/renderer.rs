//! Response rendering: quantized image to PNG or JPEG bytes.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use kmeans_palette::QuantizedImage;
use serde::Deserialize;
use std::io::Cursor;
use utoipa::ToSchema;

use crate::error::RenderError;

/// Output encoding selected by the `format` query parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Guess from a file extension (CLI output paths)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

/// Encodes quantized images for transport
#[derive(Debug, Clone)]
pub struct RenderService {
    jpeg_quality: u8,
}

impl RenderService {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn render(
        &self,
        image: &QuantizedImage,
        format: OutputFormat,
    ) -> Result<Vec<u8>, RenderError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
            return Err(RenderError::UnsupportedDimensions { width, height });
        }
        if image.codebook().depth() != 3 {
            return Err(RenderError::UnsupportedDepth(image.codebook().depth()));
        }

        match format {
            OutputFormat::Png => self.render_png(image),
            OutputFormat::Jpeg => self.render_jpeg(image),
        }
    }

    /// Indexed PNG (one PLTE entry per codebook color) when the codebook
    /// fits in 256 entries, truecolor otherwise. Re-compressed with oxipng.
    fn render_png(&self, image: &QuantizedImage) -> Result<Vec<u8>, RenderError> {
        let width = image.width() as u32;
        let codebook = image.codebook();

        let (color_type, bit_depth, plte, data) = if codebook.len() <= 256 {
            let (depth, bits) = match codebook.len() {
                0..=2 => (png::BitDepth::One, 1),
                3..=4 => (png::BitDepth::Two, 2),
                5..=16 => (png::BitDepth::Four, 4),
                _ => (png::BitDepth::Eight, 8),
            };
            let indices: Vec<u8> = image.labels().iter().map(|&l| l as u8).collect();
            let packed = if bits == 8 {
                indices
            } else {
                pack_nbits(&indices, width, bits)
            };
            (png::ColorType::Indexed, depth, Some(codebook.to_rgb8()), packed)
        } else {
            (
                png::ColorType::Rgb,
                png::BitDepth::Eight,
                None,
                image.to_rgb8()?,
            )
        };

        let png_bytes = encode_png(
            width,
            image.height() as u32,
            color_type,
            bit_depth,
            plte.as_deref(),
            &data,
        )?;

        let optimized = oxipng::optimize_from_memory(
            &png_bytes,
            &oxipng::Options {
                strip: oxipng::StripChunks::Safe,
                ..Default::default()
            },
        )
        .unwrap_or_else(|e| {
            tracing::warn!(%e, "oxipng failed, serving unoptimized PNG");
            png_bytes
        });
        Ok(optimized)
    }

    fn render_jpeg(&self, image: &QuantizedImage) -> Result<Vec<u8>, RenderError> {
        let rgb = image.to_rgb8()?;
        let mut buf = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality)
            .encode(
                &rgb,
                image.width() as u32,
                image.height() as u32,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| RenderError::JpegEncode(e.to_string()))?;
        Ok(buf.into_inner())
    }
}

fn encode_png(
    width: u32,
    height: u32,
    color_type: png::ColorType,
    bit_depth: png::BitDepth,
    plte: Option<&[u8]>,
    data: &[u8],
) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color_type);
        encoder.set_depth(bit_depth);
        // oxipng re-compresses afterwards
        encoder.set_compression(png::Compression::Fast);
        if let Some(plte) = plte {
            encoder.set_palette(plte);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(data)
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Pack palette indices into rows of 1, 2 or 4 bits per pixel.
fn pack_nbits(indices: &[u8], width: u32, bits: u8) -> Vec<u8> {
    let per_byte = 8 / bits as usize;
    let mask = (1u8 << bits) - 1;
    let mut packed = Vec::with_capacity(indices.len().div_ceil(per_byte));

    for row in indices.chunks(width as usize) {
        for group in row.chunks(per_byte) {
            let mut byte = 0u8;
            for (i, &idx) in group.iter().enumerate() {
                byte |= (idx & mask) << (8 - bits - i as u8 * bits);
            }
            packed.push(byte);
        }
    }

    packed
}
