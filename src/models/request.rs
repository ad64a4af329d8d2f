use serde::Deserialize;
use utoipa::IntoParams;

use crate::services::renderer::OutputFormat;

/// Query parameters shared by `/api/quantize` and `/api/palette`
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuantizeQuery {
    /// Longest side of the downsampled image in pixels (default from config)
    pub size: Option<u32>,

    /// Number of palette colors K (default from config)
    pub colors: Option<usize>,

    /// URL of a CSV reference table; enables palette snapping
    pub reference_url: Option<String>,

    /// Name of a built-in reference palette (e.g. `dmc`); ignored when
    /// `reference_url` is present
    pub reference: Option<String>,

    /// Response encoding, `png` (default) or `jpeg`
    #[param(value_type = Option<String>)]
    pub format: Option<OutputFormat>,
}
