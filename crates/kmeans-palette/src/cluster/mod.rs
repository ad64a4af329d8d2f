//! Color clustering.
//!
//! - [`MiniBatchKMeans`]: seeded mini-batch k-means producing a [`Codebook`](crate::Codebook)
//!   and one label per input vector
//! - [`ClusterOptions`]: every tunable, passed explicitly

mod minibatch;
mod options;

pub use minibatch::{predict, Clustering, Fit, MiniBatchKMeans};
pub use options::ClusterOptions;
