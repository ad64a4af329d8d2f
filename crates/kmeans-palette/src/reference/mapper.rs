//! Snapping a codebook onto a reference table.

use super::table::ReferenceTable;
use crate::codebook::Codebook;
use crate::error::QuantizeError;

/// A codebook whose entries were all copied from a reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMapping {
    /// K entries, each a literal copy of a table color.
    pub codebook: Codebook,
    /// `matches[k]` is the table index chosen for codebook entry `k`.
    pub matches: Vec<usize>,
}

/// Replace each codebook entry with its nearest reference color.
///
/// O(K·N) scan; ties go to the earlier table entry. The input codebook and
/// the table are left untouched. Distinct codebook entries may map to the
/// same reference color.
///
/// # Errors
///
/// - [`QuantizeError::EmptyReferenceTable`] if the table has no entries
/// - [`QuantizeError::ShapeMismatch`] if a table color's depth differs from
///   the codebook's
///
/// # Example
///
/// ```
/// use kmeans_palette::{map_codebook, Codebook, ReferenceColor, ReferenceTable};
///
/// let table = ReferenceTable::new(vec![
///     ReferenceColor::from_rgb8("black", 0, 0, 0),
///     ReferenceColor::from_rgb8("white", 255, 255, 255),
/// ]);
/// let codebook = Codebook::new(3, vec![0.05, 0.05, 0.05]).unwrap();
///
/// let mapping = map_codebook(&codebook, &table).unwrap();
/// assert_eq!(mapping.matches, vec![0]);
/// assert_eq!(mapping.codebook.get(0), &[0.0, 0.0, 0.0]);
/// ```
pub fn map_codebook(
    codebook: &Codebook,
    table: &ReferenceTable,
) -> Result<ReferenceMapping, QuantizeError> {
    if table.is_empty() {
        return Err(QuantizeError::EmptyReferenceTable);
    }
    let depth = codebook.depth();
    if let Some(entry) = table.iter().find(|e| e.color().len() != depth) {
        return Err(QuantizeError::ShapeMismatch {
            what: "reference color depth",
            expected: depth,
            actual: entry.color().len(),
        });
    }

    let mut data = Vec::with_capacity(codebook.len() * depth);
    let mut matches = Vec::with_capacity(codebook.len());
    for color in codebook.iter() {
        let (idx, _) = table
            .nearest(color)
            .ok_or(QuantizeError::EmptyReferenceTable)?;
        data.extend_from_slice(table.get(idx).color());
        matches.push(idx);
    }

    Ok(ReferenceMapping {
        codebook: Codebook::new(depth, data)?,
        matches,
    })
}
