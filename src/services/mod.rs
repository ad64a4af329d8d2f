pub mod image_loader;
pub mod quantize_service;
pub mod reference_palette;
pub mod renderer;

pub use quantize_service::{QuantizeOutcome, QuantizeParams, QuantizeService};
pub use reference_palette::{
    parse_reference_table, HttpReferenceSource, ReferenceCache, ReferencePalettes,
    ReferenceSource, ReferenceSpec,
};
pub use renderer::{OutputFormat, RenderService};
