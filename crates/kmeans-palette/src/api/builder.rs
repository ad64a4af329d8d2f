//! Quantizer builder: the primary entry point for the crate.
//!
//! [`Quantizer`] wires sampling, clustering and optional reference
//! remapping behind a fluent configuration API.

use crate::cluster::{ClusterOptions, MiniBatchKMeans};
use crate::error::QuantizeError;
use crate::output::QuantizedImage;
use crate::pixels::PixelArray;
use crate::reference::{map_codebook, ReferenceTable};
use crate::sample::ColorSamples;

/// High-level palette reducer.
///
/// - Constructor takes the cluster count
/// - Configuration methods consume and return `self`
/// - [`quantize()`](Self::quantize) takes `&self`, so one builder can serve
///   many images
///
/// # Example
///
/// ```
/// use kmeans_palette::{PixelArray, Quantizer};
///
/// let rgb = [255, 0, 0, 0, 0, 255].repeat(8);
/// let pixels = PixelArray::from_rgb8(4, 4, &rgb).unwrap();
///
/// let result = Quantizer::new(2).seed(7).quantize(&pixels, None).unwrap();
///
/// assert_eq!(result.codebook().len(), 2);
/// assert_eq!(result.to_rgb8().unwrap(), rgb);
/// ```
#[derive(Debug, Clone)]
pub struct Quantizer {
    colors: usize,
    options: ClusterOptions,
}

impl Quantizer {
    /// A quantizer producing `colors` palette entries with default
    /// [`ClusterOptions`].
    pub fn new(colors: usize) -> Self {
        Self {
            colors,
            options: ClusterOptions::default(),
        }
    }

    /// Replace every clustering option at once.
    #[inline]
    pub fn options(mut self, options: ClusterOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.options = self.options.seed(seed);
        self
    }

    #[inline]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.options = self.options.batch_size(batch_size);
        self
    }

    #[inline]
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.options = self.options.max_iter(max_iter);
        self
    }

    /// Cap the training copy; `None` trains on every pixel.
    #[inline]
    pub fn max_samples(mut self, max_samples: Option<usize>) -> Self {
        self.options = self.options.max_samples(max_samples);
        self
    }

    #[inline]
    pub fn refine(mut self, refine: bool) -> Self {
        self.options = self.options.refine(refine);
        self
    }

    #[inline]
    pub fn colors(&self) -> usize {
        self.colors
    }

    #[inline]
    pub fn cluster_options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Reduce `pixels` to at most `colors` distinct colors.
    ///
    /// With a reference table every codebook entry is snapped to its
    /// nearest table color before the result is returned.
    ///
    /// # Errors
    ///
    /// - [`QuantizeError::InvalidParameter`] for zero colors, checked before
    ///   any sampling, or more colors than pixels
    /// - [`QuantizeError::EmptyInput`] for a zero-pixel image
    /// - [`QuantizeError::EmptyReferenceTable`] when `reference` is empty,
    ///   checked before clustering
    pub fn quantize(
        &self,
        pixels: &PixelArray,
        reference: Option<&ReferenceTable>,
    ) -> Result<QuantizedImage, QuantizeError> {
        if self.colors == 0 {
            return Err(QuantizeError::InvalidParameter {
                name: "colors",
                value: 0,
                reason: "must be at least 1",
            });
        }
        if reference.is_some_and(ReferenceTable::is_empty) {
            return Err(QuantizeError::EmptyReferenceTable);
        }

        let samples = ColorSamples::from_pixels(pixels);
        let clustering = MiniBatchKMeans::new(self.options).fit_predict(&samples, self.colors)?;

        let image = match reference {
            Some(table) => {
                let mapping = map_codebook(&clustering.codebook, table)?;
                QuantizedImage::new(
                    clustering.labels,
                    pixels.width(),
                    pixels.height(),
                    mapping.codebook,
                )
                .with_reference_matches(mapping.matches)
            }
            None => QuantizedImage::new(
                clustering.labels,
                pixels.width(),
                pixels.height(),
                clustering.codebook,
            ),
        };

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceColor;

    fn checker(width: usize, height: usize) -> PixelArray {
        let rgb: Vec<u8> = (0..width * height)
            .flat_map(|i| {
                if (i % width + i / width) % 2 == 0 {
                    [240, 240, 240]
                } else {
                    [20, 40, 60]
                }
            })
            .collect();
        PixelArray::from_rgb8(width, height, &rgb).unwrap()
    }

    #[test]
    fn test_builder_forwards_options() {
        let quantizer = Quantizer::new(5)
            .seed(3)
            .batch_size(32)
            .max_iter(7)
            .max_samples(None)
            .refine(false);
        assert_eq!(quantizer.colors(), 5);
        let options = quantizer.cluster_options();
        assert_eq!(options.seed, 3);
        assert_eq!(options.batch_size, 32);
        assert_eq!(options.max_iter, 7);
        assert_eq!(options.max_samples, None);
        assert!(!options.refine);
    }

    #[test]
    fn test_zero_colors_rejected() {
        let result = Quantizer::new(0).quantize(&checker(2, 2), None);
        assert!(matches!(
            result,
            Err(QuantizeError::InvalidParameter { name: "colors", .. })
        ));
    }

    #[test]
    fn test_zero_colors_checked_before_empty_input() {
        let empty = PixelArray::new(0, 0, 3, Vec::new()).unwrap();
        assert!(matches!(
            Quantizer::new(0).quantize(&empty, None),
            Err(QuantizeError::InvalidParameter { .. })
        ));
        assert_eq!(
            Quantizer::new(1).quantize(&empty, None),
            Err(QuantizeError::EmptyInput)
        );
    }

    #[test]
    fn test_empty_reference_table_rejected() {
        let result = Quantizer::new(2).quantize(&checker(4, 4), Some(&ReferenceTable::default()));
        assert_eq!(result, Err(QuantizeError::EmptyReferenceTable));
    }

    #[test]
    fn test_reference_mapping_applied() {
        let table = ReferenceTable::new(vec![
            ReferenceColor::from_rgb8("white", 255, 255, 255),
            ReferenceColor::from_rgb8("navy", 0, 0, 128),
            ReferenceColor::from_rgb8("black", 0, 0, 0),
        ]);
        let result = Quantizer::new(2).quantize(&checker(4, 4), Some(&table)).unwrap();

        let matches = result.reference_matches().unwrap();
        assert_eq!(matches.len(), 2);
        for (entry, &idx) in result.codebook().iter().zip(matches) {
            assert_eq!(entry, table.get(idx).color());
        }
        let mut sorted = matches.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 2]);
    }

    #[test]
    fn test_oversized_batch_size() {
        let pixels = checker(4, 4);
        let result = Quantizer::new(2)
            .batch_size(usize::MAX)
            .quantize(&pixels, None)
            .unwrap();
        assert_eq!(result.to_pixels().unwrap(), pixels);
    }

    #[test]
    fn test_reusable_across_images() {
        let quantizer = Quantizer::new(2);
        let a = quantizer.quantize(&checker(4, 4), None).unwrap();
        let b = quantizer.quantize(&checker(6, 2), None).unwrap();
        assert_eq!(a.width(), 4);
        assert_eq!(b.width(), 6);
    }
}
