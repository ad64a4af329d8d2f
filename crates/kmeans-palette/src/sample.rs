//! Color sampling: flattening a pixel grid into a sequence of color vectors.
//!
//! [`ColorSamples::from_pixels`] keeps row-major order and is what labels are
//! predicted for. [`ColorSamples::shuffled`] produces an independent,
//! seeded training copy that is only ever used to fit the clusterer.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::QuantizeError;
use crate::pixels::PixelArray;

/// An ordered sequence of `depth`-dimensional color vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSamples {
    depth: usize,
    data: Vec<f32>,
}

impl ColorSamples {
    /// Flatten a pixel array, one vector per pixel, row-major.
    pub fn from_pixels(pixels: &PixelArray) -> Self {
        Self {
            depth: pixels.depth(),
            data: pixels.as_slice().to_vec(),
        }
    }

    /// Wrap flat vector data directly.
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
                what: "sample data",
                expected: data.len() - data.len() % depth,
                actual: data.len(),
            });
        }
        Ok(Self { depth, data })
    }

    /// Number of vectors.
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

    /// The vector at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn get(&self, i: usize) -> &[f32] {
        &self.data[i * self.depth..(i + 1) * self.depth]
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.depth)
    }

    /// Seeded random permutation of the sequence, optionally truncated.
    ///
    /// The same seed always yields the same permutation. Truncating after a
    /// full shuffle gives a uniform subsample without replacement. `self` is
    /// left untouched.
    pub fn shuffled(&self, seed: u64, max_samples: Option<usize>) -> ColorSamples {
        let mut order: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        if let Some(max) = max_samples {
            order.truncate(max);
        }

        let mut data = Vec::with_capacity(order.len() * self.depth);
        for i in order {
            data.extend_from_slice(self.get(i));
        }

        ColorSamples {
            depth: self.depth,
            data,
        }
    }
}
