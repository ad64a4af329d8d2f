//! Image reconstruction from a codebook and per-pixel labels.

use crate::codebook::Codebook;
use crate::error::QuantizeError;
use crate::pixels::PixelArray;

/// Rebuild a `width × height` pixel array where pixel `i` is
/// `codebook[labels[i]]`.
///
/// The output depth is the codebook's depth. No blending happens: every
/// output pixel is a verbatim copy of one codebook entry.
///
/// # Errors
///
/// [`QuantizeError::ShapeMismatch`] if `labels.len() != width * height` or a
/// label is not below `codebook.len()`.
///
/// # Example
///
/// ```
/// use kmeans_palette::{reconstruct, Codebook};
///
/// let codebook = Codebook::new(3, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
/// let pixels = reconstruct(&codebook, &[0, 1, 1, 0], 2, 2).unwrap();
///
/// assert_eq!(pixels.pixel(1), &[0.0, 0.0, 1.0]);
/// assert_eq!(pixels.pixel(3), &[1.0, 0.0, 0.0]);
/// ```
pub fn reconstruct(
    codebook: &Codebook,
    labels: &[u32],
    width: usize,
    height: usize,
) -> Result<PixelArray, QuantizeError> {
    let expected = width * height;
    if labels.len() != expected {
        return Err(QuantizeError::ShapeMismatch {
            what: "labels",
            expected,
            actual: labels.len(),
        });
    }

    let k = codebook.len();
    let mut data = Vec::with_capacity(expected * codebook.depth());
    for &label in labels {
        let label = label as usize;
        if label >= k {
            return Err(QuantizeError::ShapeMismatch {
                what: "label range",
                expected: k,
                actual: label,
            });
        }
        data.extend_from_slice(codebook.get(label));
    }

    PixelArray::new(width, height, codebook.depth(), data)
}
