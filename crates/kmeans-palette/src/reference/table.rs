//! Reference color tables (thread catalogs, paint sets, ...).

use crate::codebook::squared_distance;
use crate::error::ParseColorError;
use crate::pixels::channel_to_u8;

/// One labeled entry of a [`ReferenceTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceColor {
    label: String,
    color: Vec<f32>,
}

impl ReferenceColor {
    /// An entry with an arbitrary color vector.
    pub fn new(label: impl Into<String>, color: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }

    /// An RGB entry from byte channels, normalized to `0.0..=1.0`.
    pub fn from_rgb8(label: impl Into<String>, r: u8, g: u8, b: u8) -> Self {
        Self::new(
            label,
            vec![
                f32::from(r) / 255.0,
                f32::from(g) / 255.0,
                f32::from(b) / 255.0,
            ],
        )
    }

    /// An RGB entry from `#RRGGBB` or `#RGB` (the `#` is optional).
    ///
    /// ```
    /// use kmeans_palette::ReferenceColor;
    ///
    /// let white = ReferenceColor::from_hex("White", "#fff").unwrap();
    /// assert_eq!(white.to_rgb8(), vec![255, 255, 255]);
    /// ```
    pub fn from_hex(label: impl Into<String>, hex: &str) -> Result<Self, ParseColorError> {
        let hex = hex.trim();
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return Err(ParseColorError::InvalidLength(digits.chars().count()));
        }

        let [r, g, b] = match digits.len() {
            // Shorthand digits expand by repetition: 0xA -> 0xAA
            3 => [
                u8::from_str_radix(&digits[0..1], 16)? * 17,
                u8::from_str_radix(&digits[1..2], 16)? * 17,
                u8::from_str_radix(&digits[2..3], 16)? * 17,
            ],
            6 => [
                u8::from_str_radix(&digits[0..2], 16)?,
                u8::from_str_radix(&digits[2..4], 16)?,
                u8::from_str_radix(&digits[4..6], 16)?,
            ],
            len => return Err(ParseColorError::InvalidLength(len)),
        };

        Ok(Self::from_rgb8(label, r, g, b))
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn color(&self) -> &[f32] {
        &self.color
    }

    pub fn to_rgb8(&self) -> Vec<u8> {
        self.color.iter().map(|&v| channel_to_u8(v)).collect()
    }

    /// `#rrggbb` for 3-channel colors.
    pub fn to_hex(&self) -> String {
        hex_string(&self.color)
    }
}

/// An ordered, read-only collection of reference colors.
///
/// Order matters: it decides ties in [`ReferenceTable::nearest`]. An empty
/// table is constructible; the mapper rejects it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    entries: Vec<ReferenceColor>,
}

impl ReferenceTable {
    pub fn new(entries: Vec<ReferenceColor>) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn get(&self, i: usize) -> &ReferenceColor {
        &self.entries[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceColor> {
        self.entries.iter()
    }

    /// Depth of the first entry, `None` for an empty table.
    pub fn depth(&self) -> Option<usize> {
        self.entries.first().map(|e| e.color.len())
    }

    /// Index and squared distance of the entry nearest to `color`.
    ///
    /// Full linear scan. When several entries are equally close the one
    /// appearing first wins. `None` for an empty table.
    pub fn nearest(&self, color: &[f32]) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let dist = squared_distance(&entry.color, color);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((i, dist)),
            }
        }
        best
    }
}

impl FromIterator<ReferenceColor> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = ReferenceColor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ReferenceTable {
    type Item = &'a ReferenceColor;
    type IntoIter = std::slice::Iter<'a, ReferenceColor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Lowercase `#rrggbb...` rendering of normalized channels.
pub fn hex_string(color: &[f32]) -> String {
    let mut out = String::with_capacity(1 + color.len() * 2);
    out.push('#');
    for &v in color {
        out.push_str(&format!("{:02x}", channel_to_u8(v)));
    }
    out
}
