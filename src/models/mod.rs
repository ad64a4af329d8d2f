pub mod config;
pub mod request;

pub use config::{AppConfig, ClusteringConfig, ReferenceCacheConfig};
pub use request::QuantizeQuery;
