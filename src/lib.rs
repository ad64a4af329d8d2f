//! Stitchpal - palette reduction service
//!
//! HTTP front end for the `kmeans-palette` quantizer: uploads are decoded,
//! downsampled, reduced to K colors (optionally snapped to a reference
//! palette such as DMC floss) and re-encoded.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
