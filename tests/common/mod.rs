//! Common test infrastructure for Stitchpal integration tests.
//!
//! Each test file compiles its own copy of this module, so items may appear
//! unused from the perspective of a single test file even though they're
//! used elsewhere.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod app;
pub mod assertions;
pub mod fixtures;
pub mod mock_server;

pub use app::{TestApp, TestResponse};
pub use assertions::*;
pub use mock_server::MockPaletteServer;
