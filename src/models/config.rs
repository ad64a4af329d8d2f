use crate::assets::AssetLoader;
use kmeans_palette::ClusterOptions;
use serde::Deserialize;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Thumbnail bound used when a request omits `size`
    pub default_size: u32,

    /// Largest accepted `size`
    pub max_size: u32,

    /// Cluster count used when a request omits `colors`
    pub default_colors: usize,

    /// Largest accepted `colors`
    pub max_colors: usize,

    /// Upload body limit in bytes
    pub max_upload_bytes: usize,

    /// JPEG quality (1-100) for `format=jpeg`
    pub jpeg_quality: u8,

    pub clustering: ClusteringConfig,

    pub reference_cache: ReferenceCacheConfig,

    /// Hosts `reference_url` may point at; empty allows any host
    pub reference_hosts: Vec<String>,
}

/// Clusterer settings shared by every request
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ClusteringConfig {
    pub seed: u64,
    pub batch_size: usize,
    pub max_iter: usize,
    /// Training sample cap; `0` trains on every pixel
    pub max_samples: usize,
    pub refine: bool,
}

/// Cache for remote reference tables
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReferenceCacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
    /// Largest remote table body accepted
    pub max_table_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_size: 128,
            max_size: 1024,
            default_colors: 8,
            max_colors: 256,
            max_upload_bytes: 10 * 1024 * 1024,
            jpeg_quality: 70,
            clustering: ClusteringConfig::default(),
            reference_cache: ReferenceCacheConfig::default(),
            reference_hosts: Vec::new(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            batch_size: 1024,
            max_iter: 100,
            max_samples: 512 * 512,
            refine: true,
        }
    }
}

impl Default for ReferenceCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_entries: 16,
            max_table_bytes: 1024 * 1024,
        }
    }
}

impl ClusteringConfig {
    /// Clusterer options for these settings.
    pub fn to_options(&self) -> ClusterOptions {
        ClusterOptions::new()
            .seed(self.seed)
            .batch_size(self.batch_size.max(1))
            .max_iter(self.max_iter)
            .max_samples((self.max_samples > 0).then_some(self.max_samples))
            .refine(self.refine)
    }
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match Self::from_yaml(&content) {
                Ok(config) => {
                    tracing::info!(
                        default_size = config.default_size,
                        default_colors = config.default_colors,
                        seed = config.clustering.seed,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse and sanity-check a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.max_size = config.max_size.max(1);
        config.max_colors = config.max_colors.max(1);
        config.default_size = config.default_size.clamp(1, config.max_size);
        config.default_colors = config.default_colors.clamp(1, config.max_colors);
        config.jpeg_quality = config.jpeg_quality.clamp(1, 100);
        config.reference_cache.max_table_bytes = config.reference_cache.max_table_bytes.max(1);
        for host in &mut config.reference_hosts {
            *host = host.trim().to_ascii_lowercase();
        }
        Ok(config)
    }
}
