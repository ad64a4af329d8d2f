//! Reference palettes and nearest-color remapping.
//!
//! A [`ReferenceTable`] is an ordered list of labeled colors, typically a
//! thread or paint catalog. [`map_codebook`] snaps every clustered color to
//! its nearest table entry so the final image only uses colors that exist
//! in the catalog.

mod mapper;
mod table;

pub use mapper::{map_codebook, ReferenceMapping};
pub use table::{hex_string, ReferenceColor, ReferenceTable};
