//! The codebook: K representative colors produced by clustering.

use crate::error::QuantizeError;
use crate::pixels::channel_to_u8;

/// K representative color vectors of equal depth.
///
/// A codebook is built once and never mutated; remapping produces a new one.
///
/// # Example
///
/// ```
/// use kmeans_palette::Codebook;
///
/// let codebook = Codebook::new(3, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
/// assert_eq!(codebook.len(), 2);
///
/// let (idx, _) = codebook.nearest(&[0.9, 0.8, 0.95]);
/// assert_eq!(idx, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    depth: usize,
    data: Vec<f32>,
}

impl Codebook {
    /// Build a codebook from flat entry data.
    ///
    /// # Errors
    ///
    /// - [`QuantizeError::InvalidParameter`] if `depth` is zero
    /// - [`QuantizeError::ShapeMismatch`] if `data.len()` is not a multiple of `depth`
    pub fn new(depth: usize, data: Vec<f32>) -> Result<Self, QuantizeError> {
        if depth == 0 {
            return Err(QuantizeError::InvalidParameter {
                name: "depth",
                value: depth,
                reason: "must be at least 1",
            });
        }
        if data.len() % depth != 0 {
            return Err(QuantizeError::ShapeMismatch {
                what: "codebook data",
                expected: data.len() - data.len() % depth,
                actual: data.len(),
            });
        }
        Ok(Self { depth, data })
    }

    /// Number of entries (K).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.depth
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The entry at index `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= self.len()`.
    #[inline]
    pub fn get(&self, k: usize) -> &[f32] {
        &self.data[k * self.depth..(k + 1) * self.depth]
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.depth)
    }

    /// Index and squared distance of the entry closest to `color`.
    ///
    /// Ties go to the lowest index.
    ///
    /// # Panics
    ///
    /// Panics if the codebook is empty.
    #[inline]
    pub fn nearest(&self, color: &[f32]) -> (usize, f32) {
        nearest_in(&self.data, self.depth, color)
    }

    /// Entries as bytes, `[R, G, B, ...]` for a 3-channel codebook.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data.iter().map(|&v| channel_to_u8(v)).collect()
    }
}

/// Sum of squared per-channel differences.
#[inline]
pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Linear scan over flat `centers` for the entry nearest to `color`.
///
/// Strict `<` keeps the first of several equidistant entries.
#[inline]
pub(crate) fn nearest_in(centers: &[f32], depth: usize, color: &[f32]) -> (usize, f32) {
    let mut best_idx = 0;
    let mut best_dist = f32::MAX;

    for (i, center) in centers.chunks_exact(depth).enumerate() {
        let dist = squared_distance(center, color);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }

    (best_idx, best_dist)
}
