//! QuantizedImage: labels plus the codebook they index.

use crate::codebook::Codebook;
use crate::error::QuantizeError;
use crate::pixels::PixelArray;
use crate::reconstruct::reconstruct;

/// The result of [`Quantizer::quantize`](crate::Quantizer::quantize).
///
/// Stores one `u32` label per pixel in row-major order together with the
/// final codebook (already remapped when a reference table was used).
/// Pixels are produced on demand by [`to_pixels`](Self::to_pixels).
///
/// # Example
///
/// ```
/// use kmeans_palette::{Codebook, QuantizedImage};
///
/// let codebook = Codebook::new(3, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
/// let image = QuantizedImage::new(vec![0, 1, 1, 0], 2, 2, codebook);
///
/// assert_eq!(image.color_counts(), vec![2, 2]);
/// assert_eq!(image.to_rgb8().unwrap().len(), 2 * 2 * 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedImage {
    labels: Vec<u32>,
    width: usize,
    height: usize,
    codebook: Codebook,
    reference_matches: Option<Vec<usize>>,
}

impl QuantizedImage {
    /// # Panics (debug only)
    ///
    /// Debug-asserts that `labels.len() == width * height`.
    pub fn new(labels: Vec<u32>, width: usize, height: usize, codebook: Codebook) -> Self {
        debug_assert_eq!(
            labels.len(),
            width * height,
            "labels length ({}) must match width * height ({}x{})",
            labels.len(),
            width,
            height,
        );
        Self {
            labels,
            width,
            height,
            codebook,
            reference_matches: None,
        }
    }

    /// Attach the reference-table index chosen for each codebook entry.
    pub fn with_reference_matches(mut self, matches: Vec<usize>) -> Self {
        debug_assert_eq!(matches.len(), self.codebook.len());
        self.reference_matches = Some(matches);
        self
    }

    #[inline]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    /// Table indices per codebook entry, `None` when no reference table was used.
    #[inline]
    pub fn reference_matches(&self) -> Option<&[usize]> {
        self.reference_matches.as_deref()
    }

    /// Rebuild the pixel array (see [`reconstruct`]).
    pub fn to_pixels(&self) -> Result<PixelArray, QuantizeError> {
        reconstruct(&self.codebook, &self.labels, self.width, self.height)
    }

    /// Packed bytes of the reconstructed image, `width * height * depth` long.
    pub fn to_rgb8(&self) -> Result<Vec<u8>, QuantizeError> {
        Ok(self.to_pixels()?.to_rgb8())
    }

    /// Number of pixels carrying each label, indexed by codebook entry.
    pub fn color_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.codebook.len()];
        for &label in &self.labels {
            if let Some(count) = counts.get_mut(label as usize) {
                *count += 1;
            }
        }
        counts
    }
}
