//! Request-level pipeline: validate parameters, resolve the reference
//! table, then decode, quantize and encode off the async runtime.

use kmeans_palette::{hex_string, QuantizedImage, Quantizer, ReferenceTable};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{AppConfig, QuantizeQuery};
use crate::services::image_loader;
use crate::services::reference_palette::{ReferencePalettes, ReferenceSpec};
use crate::services::renderer::{OutputFormat, RenderService};

/// Validated request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeParams {
    pub size: u32,
    pub colors: usize,
    pub reference: Option<ReferenceSpec>,
    pub format: OutputFormat,
}

/// A finished quantization plus the table it was snapped to, if any
pub struct QuantizeOutcome {
    pub image: QuantizedImage,
    pub reference: Option<Arc<ReferenceTable>>,
}

impl QuantizeOutcome {
    /// Final palette as `#rrggbb` strings, in codebook order
    pub fn palette_hex(&self) -> Vec<String> {
        self.image.codebook().iter().map(hex_string).collect()
    }

    /// Reference label per codebook entry, when a table was used
    pub fn reference_labels(&self) -> Option<Vec<String>> {
        let table = self.reference.as_ref()?;
        let matches = self.image.reference_matches()?;
        Some(
            matches
                .iter()
                .map(|&i| table.get(i).label().to_string())
                .collect(),
        )
    }
}

pub struct QuantizeService {
    config: Arc<AppConfig>,
    references: Arc<ReferencePalettes>,
    renderer: Arc<RenderService>,
}

impl QuantizeService {
    pub fn new(
        config: Arc<AppConfig>,
        references: Arc<ReferencePalettes>,
        renderer: Arc<RenderService>,
    ) -> Self {
        Self {
            config,
            references,
            renderer,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn references(&self) -> &ReferencePalettes {
        &self.references
    }

    /// Apply defaults and bounds to raw query parameters.
    pub fn params(&self, query: &QuantizeQuery) -> Result<QuantizeParams, ApiError> {
        let size = query.size.unwrap_or(self.config.default_size);
        if size == 0 || size > self.config.max_size {
            return Err(ApiError::InvalidParameter {
                name: "size",
                reason: format!("must be between 1 and {}, got {size}", self.config.max_size),
            });
        }

        let colors = query.colors.unwrap_or(self.config.default_colors);
        if colors == 0 || colors > self.config.max_colors {
            return Err(ApiError::InvalidParameter {
                name: "colors",
                reason: format!(
                    "must be between 1 and {}, got {colors}",
                    self.config.max_colors
                ),
            });
        }

        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let reference = match (non_empty(&query.reference_url), non_empty(&query.reference)) {
            (Some(url), _) => {
                self.check_reference_url(&url)?;
                Some(ReferenceSpec::Url(url))
            }
            (None, Some(name)) => Some(ReferenceSpec::Builtin(name)),
            (None, None) => None,
        };

        Ok(QuantizeParams {
            size,
            colors,
            reference,
            format: query.format.unwrap_or_default(),
        })
    }

    /// Only http(s) URLs, and only allowlisted hosts when an allowlist is set.
    fn check_reference_url(&self, url: &str) -> Result<(), ApiError> {
        let invalid = |reason: String| ApiError::InvalidParameter {
            name: "reference_url",
            reason,
        };

        let parsed = reqwest::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("must be an http(s) URL".to_string()));
        }

        let allowed = &self.config.reference_hosts;
        if !allowed.is_empty() {
            let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
            if !allowed.iter().any(|h| *h == host) {
                return Err(invalid(format!("host {host:?} is not allowed")));
            }
        }
        Ok(())
    }

    /// Decode, downsample and quantize an upload.
    pub async fn quantize(
        &self,
        bytes: Vec<u8>,
        params: &QuantizeParams,
    ) -> Result<QuantizeOutcome, ApiError> {
        let reference = match &params.reference {
            Some(spec) => Some(self.references.resolve(spec).await?),
            None => None,
        };

        let quantizer = Quantizer::new(params.colors).options(self.config.clustering.to_options());
        let size = params.size;
        let table = reference.clone();

        let image = tokio::task::spawn_blocking(move || -> Result<QuantizedImage, ApiError> {
            let pixels = image_loader::load_pixels(&bytes, size)?;
            tracing::debug!(
                width = pixels.width(),
                height = pixels.height(),
                colors = quantizer.colors(),
                "Quantizing"
            );
            Ok(quantizer.quantize(&pixels, table.as_deref())?)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Quantize task failed: {e}")))??;

        Ok(QuantizeOutcome { image, reference })
    }

    /// Encode a quantized image in a blocking context.
    pub async fn render(
        &self,
        outcome: &QuantizeOutcome,
        format: OutputFormat,
    ) -> Result<Vec<u8>, ApiError> {
        let renderer = self.renderer.clone();
        let image = outcome.image.clone();

        let bytes = tokio::task::spawn_blocking(move || renderer.render(&image, format))
            .await
            .map_err(|e| ApiError::Internal(format!("Render task failed: {e}")))??;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetLoader;
    use crate::services::reference_palette::{HttpReferenceSource, ReferenceCache};
    use std::time::Duration;

    fn service() -> QuantizeService {
        service_with(AppConfig::default())
    }

    fn service_with(config: AppConfig) -> QuantizeService {
        let config = Arc::new(config);
        let references = Arc::new(ReferencePalettes::new(
            Arc::new(AssetLoader::default()),
            Arc::new(HttpReferenceSource::new(Duration::from_secs(1), 1024).unwrap()),
            ReferenceCache::from_config(&config.reference_cache),
        ));
        let renderer = Arc::new(RenderService::new(config.jpeg_quality));
        QuantizeService::new(config, references, renderer)
    }

    #[test]
    fn test_params_defaults() {
        let params = service().params(&QuantizeQuery::default()).unwrap();
        assert_eq!(params.size, 128);
        assert_eq!(params.colors, 8);
        assert_eq!(params.reference, None);
        assert_eq!(params.format, OutputFormat::Png);
    }

    #[test]
    fn test_params_bounds() {
        let svc = service();
        for query in [
            QuantizeQuery {
                size: Some(0),
                ..Default::default()
            },
            QuantizeQuery {
                size: Some(5000),
                ..Default::default()
            },
            QuantizeQuery {
                colors: Some(0),
                ..Default::default()
            },
            QuantizeQuery {
                colors: Some(257),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                svc.params(&query),
                Err(ApiError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_params_reference_precedence() {
        let svc = service();
        let params = svc
            .params(&QuantizeQuery {
                reference_url: Some("https://example.test/p.csv".to_string()),
                reference: Some("dmc".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            params.reference,
            Some(ReferenceSpec::Url("https://example.test/p.csv".to_string()))
        );

        let params = svc
            .params(&QuantizeQuery {
                reference_url: Some("  ".to_string()),
                reference: Some("dmc".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(params.reference, Some(ReferenceSpec::Builtin("dmc".to_string())));
    }

    #[test]
    fn test_params_rejects_non_http_url() {
        let result = service().params(&QuantizeQuery {
            reference_url: Some("file:///etc/passwd".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(ApiError::InvalidParameter { name: "reference_url", .. })
        ));
    }

    #[test]
    fn test_params_rejects_unparsable_url() {
        let result = service().params(&QuantizeQuery {
            reference_url: Some("http://".to_string()),
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(ApiError::InvalidParameter { name: "reference_url", .. })
        ));
    }

    #[test]
    fn test_params_reference_host_allowlist() {
        let svc = service_with(AppConfig {
            reference_hosts: vec!["palettes.example.test".to_string()],
            ..AppConfig::default()
        });
        let query = |url: &str| QuantizeQuery {
            reference_url: Some(url.to_string()),
            ..Default::default()
        };

        assert!(svc
            .params(&query("https://Palettes.Example.Test/dmc.csv"))
            .is_ok());
        for url in [
            "http://169.254.169.254/latest/meta-data",
            "http://localhost:8080/p.csv",
            "https://palettes.example.test.evil.test/p.csv",
        ] {
            assert!(
                matches!(
                    svc.params(&query(url)),
                    Err(ApiError::InvalidParameter { name: "reference_url", .. })
                ),
                "{url} should be rejected"
            );
        }
        // Built-in names are unaffected
        assert!(svc
            .params(&QuantizeQuery {
                reference: Some("dmc".to_string()),
                ..Default::default()
            })
            .is_ok());
    }
}
