//! Mini-batch k-means (Sculley, "Web-Scale K-Means Clustering", 2010).
//!
//! Centers are seeded with k-means++ on a prefix of the shuffled training
//! copy, then refined by repeatedly drawing small uniform batches. Each
//! sample pulls its (pre-assigned) center towards itself with a per-center
//! learning rate of `1 / count`, so a center is always the running mean of
//! everything it has absorbed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::options::ClusterOptions;
use crate::codebook::{nearest_in, squared_distance, Codebook};
use crate::error::QuantizeError;
use crate::sample::ColorSamples;

/// Result of [`MiniBatchKMeans::fit_predict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// The K fitted centers.
    pub codebook: Codebook,
    /// One label per input vector, in input order.
    pub labels: Vec<u32>,
    /// Mini-batch iterations actually run.
    pub iterations: usize,
    /// Whether an early-stopping criterion fired before the budget ran out.
    pub converged: bool,
}

/// A fitted codebook plus iteration statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Fit {
    pub codebook: Codebook,
    pub iterations: usize,
    pub converged: bool,
}

/// Seeded mini-batch k-means clusterer.
///
/// # Example
///
/// ```
/// use kmeans_palette::{ClusterOptions, ColorSamples, MiniBatchKMeans};
///
/// let samples = ColorSamples::new(3, vec![
///     1.0, 0.0, 0.0,
///     0.0, 0.0, 1.0,
///     1.0, 0.0, 0.0,
///     0.0, 0.0, 1.0,
/// ]).unwrap();
///
/// let clustering = MiniBatchKMeans::new(ClusterOptions::new())
///     .fit_predict(&samples, 2)
///     .unwrap();
///
/// assert_eq!(clustering.codebook.len(), 2);
/// assert_eq!(clustering.labels[0], clustering.labels[2]);
/// assert_ne!(clustering.labels[0], clustering.labels[1]);
/// ```
#[derive(Debug, Clone)]
pub struct MiniBatchKMeans {
    options: ClusterOptions,
}

impl MiniBatchKMeans {
    pub fn new(options: ClusterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Fit `k` centers on a shuffled training copy of `samples`.
    ///
    /// # Errors
    ///
    /// Checked in this order, before any work is done:
    /// - [`QuantizeError::InvalidParameter`] if `k` is zero
    /// - [`QuantizeError::EmptyInput`] if `samples` is empty
    /// - [`QuantizeError::InvalidParameter`] if `k` exceeds `samples.len()`
    pub fn fit(&self, samples: &ColorSamples, k: usize) -> Result<Fit, QuantizeError> {
        validate(samples, k)?;

        let opts = &self.options;
        let depth = samples.depth();
        let training = samples.shuffled(opts.seed, opts.max_samples.map(|m| m.max(k)));
        let n = training.len();
        let mut rng = StdRng::seed_from_u64(opts.seed);

        let batch_size = opts.batch_size.clamp(1, n);
        let init_size = batch_size.saturating_mul(3).max(k).min(n);
        let mut centers = kmeans_plus_plus(&training, init_size, k, &mut rng);

        let shift_tol = if opts.tol > 0.0 {
            f64::from(opts.tol) * mean_variance(&training)
        } else {
            0.0
        };
        // Smoothing weight for the batch inertia average
        let alpha = (2.0 * batch_size as f64 / (n as f64 + 1.0)).min(1.0);

        let mut counts = vec![0u64; k];
        let mut batch: Vec<usize> = Vec::with_capacity(batch_size);
        let mut assigned: Vec<usize> = Vec::with_capacity(batch_size);
        let mut ewa_inertia: Option<f64> = None;
        let mut best_inertia = f64::INFINITY;
        let mut no_improvement = 0;
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..opts.max_iter {
            iterations += 1;

            batch.clear();
            batch.extend((0..batch_size).map(|_| rng.gen_range(0..n)));

            // Assign the whole batch against the centers as they were at the
            // start of the step, then apply the gradient steps.
            assigned.clear();
            let mut inertia = 0.0f64;
            for &i in &batch {
                let (c, dist) = nearest_in(&centers, depth, training.get(i));
                assigned.push(c);
                inertia += f64::from(dist);
            }
            inertia /= batch_size as f64;

            let mut shift = 0.0f64;
            for (&i, &c) in batch.iter().zip(&assigned) {
                counts[c] += 1;
                let rate = (1.0 / counts[c] as f64) as f32;
                let center = &mut centers[c * depth..(c + 1) * depth];
                for (cv, &xv) in center.iter_mut().zip(training.get(i)) {
                    let step = rate * (xv - *cv);
                    *cv += step;
                    shift += f64::from(step * step);
                }
            }

            let smoothed = match ewa_inertia {
                Some(prev) => prev * (1.0 - alpha) + inertia * alpha,
                None => inertia,
            };
            ewa_inertia = Some(smoothed);

            if shift_tol > 0.0 && shift <= shift_tol {
                converged = true;
                break;
            }

            if smoothed < best_inertia {
                best_inertia = smoothed;
                no_improvement = 0;
            } else {
                no_improvement += 1;
                if opts.max_no_improvement > 0 && no_improvement >= opts.max_no_improvement {
                    converged = true;
                    break;
                }
            }
        }

        if opts.refine {
            refine_centers(&training, &mut centers, k);
        }

        Ok(Fit {
            codebook: Codebook::new(depth, centers)?,
            iterations,
            converged,
        })
    }

    /// Fit on a training copy, then label every vector of `samples` in order.
    pub fn fit_predict(&self, samples: &ColorSamples, k: usize) -> Result<Clustering, QuantizeError> {
        let fit = self.fit(samples, k)?;
        let labels = predict(&fit.codebook, samples);

        Ok(Clustering {
            codebook: fit.codebook,
            labels,
            iterations: fit.iterations,
            converged: fit.converged,
        })
    }
}

/// Label each sample with the index of its nearest codebook entry.
///
/// # Panics
///
/// Panics if the codebook is empty while `samples` is not.
pub fn predict(codebook: &Codebook, samples: &ColorSamples) -> Vec<u32> {
    samples
        .iter()
        .map(|color| codebook.nearest(color).0 as u32)
        .collect()
}

fn validate(samples: &ColorSamples, k: usize) -> Result<(), QuantizeError> {
    if k == 0 {
        return Err(QuantizeError::InvalidParameter {
            name: "colors",
            value: k,
            reason: "must be at least 1",
        });
    }
    if samples.is_empty() {
        return Err(QuantizeError::EmptyInput);
    }
    if k > samples.len() {
        return Err(QuantizeError::InvalidParameter {
            name: "colors",
            value: k,
            reason: "exceeds the number of pixels",
        });
    }
    if k > u32::MAX as usize {
        return Err(QuantizeError::InvalidParameter {
            name: "colors",
            value: k,
            reason: "exceeds the label range",
        });
    }
    Ok(())
}

/// k-means++ seeding over the first `init_size` training vectors.
///
/// When every candidate already coincides with a chosen center (more
/// clusters than distinct colors) the next center is drawn uniformly, which
/// yields a duplicate center instead of an error.
fn kmeans_plus_plus(
    training: &ColorSamples,
    init_size: usize,
    k: usize,
    rng: &mut StdRng,
) -> Vec<f32> {
    let depth = training.depth();
    let mut centers = Vec::with_capacity(k * depth);

    let first = rng.gen_range(0..init_size);
    centers.extend_from_slice(training.get(first));

    let mut closest: Vec<f32> = (0..init_size)
        .map(|i| squared_distance(training.get(i), training.get(first)))
        .collect();

    for _ in 1..k {
        let total: f64 = closest.iter().map(|&d| f64::from(d)).sum();

        let next = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = None;
            let mut last_positive = 0;
            for (i, &d) in closest.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                last_positive = i;
                target -= f64::from(d);
                if target < 0.0 {
                    chosen = Some(i);
                    break;
                }
            }
            // Rounding can leave a sliver of `target`; never fall back to a
            // point that already sits on a center.
            chosen.unwrap_or(last_positive)
        } else {
            rng.gen_range(0..init_size)
        };

        let candidate = training.get(next);
        centers.extend_from_slice(candidate);
        for (i, d) in closest.iter_mut().enumerate() {
            let dist = squared_distance(training.get(i), candidate);
            if dist < *d {
                *d = dist;
            }
        }
    }

    centers
}

/// One Lloyd step: move each center that owns samples to their exact mean.
fn refine_centers(training: &ColorSamples, centers: &mut [f32], k: usize) {
    let depth = training.depth();
    let mut sums = vec![0.0f64; k * depth];
    let mut counts = vec![0usize; k];

    for color in training.iter() {
        let (c, _) = nearest_in(centers, depth, color);
        counts[c] += 1;
        for (sum, &v) in sums[c * depth..(c + 1) * depth].iter_mut().zip(color) {
            *sum += f64::from(v);
        }
    }

    for c in 0..k {
        if counts[c] == 0 {
            continue;
        }
        let n = counts[c] as f64;
        for j in 0..depth {
            centers[c * depth + j] = (sums[c * depth + j] / n) as f32;
        }
    }
}

/// Mean over channels of the per-channel variance.
fn mean_variance(samples: &ColorSamples) -> f64 {
    let depth = samples.depth();
    let n = samples.len() as f64;
    let mut sum = vec![0.0f64; depth];
    let mut sum_sq = vec![0.0f64; depth];

    for color in samples.iter() {
        for (j, &v) in color.iter().enumerate() {
            let v = f64::from(v);
            sum[j] += v;
            sum_sq[j] += v * v;
        }
    }

    let total: f64 = sum
        .iter()
        .zip(&sum_sq)
        .map(|(&s, &sq)| (sq / n - (s / n) * (s / n)).max(0.0))
        .sum();
    total / depth as f64
}
