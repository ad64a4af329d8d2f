pub mod quantize;

pub use quantize::{__path_handle_list_palettes, __path_handle_palette, __path_handle_quantize};
pub use quantize::{
    handle_list_palettes, handle_palette, handle_quantize, PaletteColor, PaletteListResponse,
    PaletteResponse, UploadForm, PALETTE_HEADER,
};
