//! Clustering options and configuration.
//!
//! This module provides the [`ClusterOptions`] struct for configuring
//! mini-batch k-means.

/// Configuration options for mini-batch k-means.
///
/// Every tunable of the clusterer lives here and is passed in explicitly,
/// so two requests never share defaults through global state.
///
/// # Defaults
///
/// - Seed: 0
/// - Batch size: 1024
/// - Maximum iterations: 100
/// - Early stop after 10 batches without inertia improvement
/// - Center-shift tolerance: 0.0 (disabled)
/// - Training samples: at most 262144
/// - Final refinement pass: enabled
///
/// # Example
///
/// ```
/// use kmeans_palette::ClusterOptions;
///
/// let options = ClusterOptions::new()
///     .seed(42)
///     .batch_size(256)
///     .max_samples(Some(10_000));
/// assert_eq!(options.batch_size, 256);
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    /// Seed for the shuffle, the center initialization and batch draws.
    ///
    /// Default: `0`
    pub seed: u64,

    /// Number of samples drawn (with replacement) per iteration.
    ///
    /// Capped at the training set size. Default: `1024`
    pub batch_size: usize,

    /// Iteration budget. Running out is not an error; the current centers
    /// are returned.
    ///
    /// Default: `100`
    pub max_iter: usize,

    /// Stop after this many consecutive batches without improvement of the
    /// smoothed batch inertia. `0` disables the check.
    ///
    /// Default: `10`
    pub max_no_improvement: usize,

    /// Stop when the summed squared center movement of one batch falls to
    /// or below `tol` times the mean per-channel variance of the data.
    /// `0.0` disables the check.
    ///
    /// Default: `0.0`
    pub tol: f32,

    /// Upper bound on the training copy's length. Never applied below the
    /// requested cluster count. `None` trains on every pixel.
    ///
    /// Default: `Some(262_144)`
    pub max_samples: Option<usize>,

    /// Finish with one full pass that moves every non-empty center to the
    /// exact mean of the training samples assigned to it.
    ///
    /// Default: `true`
    pub refine: bool,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterOptions {
    /// Create options with default values.
    #[inline]
    pub const fn new() -> Self {
        Self {
            seed: 0,
            batch_size: 1024,
            max_iter: 100,
            max_no_improvement: 10,
            tol: 0.0,
            max_samples: Some(512 * 512),
            refine: true,
        }
    }

    /// Set the random seed.
    #[inline]
    pub const fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Set the mini-batch size.
    #[inline]
    pub const fn batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set the iteration budget.
    #[inline]
    pub const fn max_iter(self, max_iter: usize) -> Self {
        Self { max_iter, ..self }
    }

    /// Set the no-improvement patience.
    #[inline]
    pub const fn max_no_improvement(self, max_no_improvement: usize) -> Self {
        Self {
            max_no_improvement,
            ..self
        }
    }

    /// Set the center-shift tolerance.
    #[inline]
    pub const fn tol(self, tol: f32) -> Self {
        Self { tol, ..self }
    }

    /// Set the training sample cap.
    #[inline]
    pub const fn max_samples(self, max_samples: Option<usize>) -> Self {
        Self {
            max_samples,
            ..self
        }
    }

    /// Enable or disable the final refinement pass.
    #[inline]
    pub const fn refine(self, refine: bool) -> Self {
        Self { refine, ..self }
    }
}
