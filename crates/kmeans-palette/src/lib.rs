//! kmeans-palette: palette reduction by mini-batch k-means
//!
//! This library reduces an image to K representative colors and can snap
//! those colors onto a fixed reference palette such as a thread catalog.
//! It performs no I/O: callers hand in decoded pixels and get labels, a
//! codebook and reconstructed pixels back.
//!
//! # Quick Start
//!
//! The [`Quantizer`] builder is the primary entry point:
//!
//! ```
//! use kmeans_palette::{PixelArray, Quantizer};
//!
//! let rgb = [200, 10, 10, 10, 10, 200, 10, 200, 10, 200, 10, 10];
//! let pixels = PixelArray::from_rgb8(2, 2, &rgb).unwrap();
//!
//! let result = Quantizer::new(3).quantize(&pixels, None).unwrap();
//! let out = result.to_pixels().unwrap();
//!
//! assert_eq!(out.width(), 2);
//! assert_eq!(out.height(), 2);
//! assert_eq!(result.codebook().len(), 3);
//! ```
//!
//! # Reference Palettes
//!
//! ```
//! use kmeans_palette::{PixelArray, Quantizer, ReferenceColor, ReferenceTable};
//!
//! let table = ReferenceTable::new(vec![
//!     ReferenceColor::from_hex("310", "#000000").unwrap(),
//!     ReferenceColor::from_hex("B5200", "#ffffff").unwrap(),
//! ]);
//! let pixels = PixelArray::from_rgb8(1, 1, &[10, 10, 10]).unwrap();
//!
//! let result = Quantizer::new(1).quantize(&pixels, Some(&table)).unwrap();
//! assert_eq!(result.reference_matches(), Some(&[0][..]));
//! assert_eq!(result.to_rgb8().unwrap(), vec![0, 0, 0]);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! PixelArray (W x H x D)
//!     |
//!     v
//! ColorSamples            (row-major, kept for labeling)
//!     |
//!     +---> shuffled copy  (seeded, truncated to max_samples; training only)
//!     |         |
//!     |    MiniBatchKMeans  (k-means++ init, mini-batch updates, refine)
//!     |         |
//!     |      Codebook (K x D)
//!     |         |
//!     v         v
//! predict -> labels (W * H)
//!               |
//!     [map_codebook]      (optional: snap entries to ReferenceTable)
//!               |
//!               v
//!         reconstruct -> PixelArray (W x H x D)
//! ```
//!
//! Every stage is deterministic for a fixed seed. Nearest-color searches
//! resolve ties to the lowest index, so both codebook order and reference
//! table order are significant.

pub mod api;
pub mod cluster;
pub mod codebook;
pub mod error;
pub mod output;
pub mod pixels;
pub mod reconstruct;
pub mod reference;
pub mod sample;


pub use api::Quantizer;
pub use cluster::{predict, ClusterOptions, Clustering, Fit, MiniBatchKMeans};
pub use codebook::Codebook;
pub use error::{ParseColorError, QuantizeError};
pub use output::QuantizedImage;
pub use pixels::PixelArray;
pub use reconstruct::reconstruct;
pub use reference::{hex_string, map_codebook, ReferenceColor, ReferenceMapping, ReferenceTable};
pub use sample::ColorSamples;
