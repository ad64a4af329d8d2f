//! Error types for the quantization pipeline
//!
//! [`QuantizeError`] covers every pipeline stage; [`ParseColorError`] is
//! only produced while building reference tables from hex strings.

use std::fmt;
use std::num::ParseIntError;

/// Error type for the quantization pipeline.
///
/// Every stage returns one of these variants; no stage produces a partial
/// result alongside an error.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantizeError {
    /// A numeric parameter is zero or out of range (cluster count, depth, size)
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// The rejected value
        value: usize,
        /// Why the value was rejected
        reason: &'static str,
    },
    /// The image has no pixels, or the sample sequence is empty
    EmptyInput,
    /// Lengths of labels, codebook, or pixel data disagree
    ///
    /// Components composed by this crate never produce this; it signals a
    /// broken invariant in caller-supplied data.
    ShapeMismatch {
        /// What was being checked
        what: &'static str,
        /// The expected length or bound
        expected: usize,
        /// The observed length or value
        actual: usize,
    },
    /// Remapping was requested against a reference table with no entries
    EmptyReferenceTable,
}

impl fmt::Display for QuantizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantizeError::InvalidParameter {
                name,
                value,
                reason,
            } => {
                write!(f, "invalid parameter {}={}: {}", name, value, reason)
            }
            QuantizeError::EmptyInput => {
                write!(f, "input contains no pixels")
            }
            QuantizeError::ShapeMismatch {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "shape mismatch in {}: expected {}, got {}",
                    what, expected, actual
                )
            }
            QuantizeError::EmptyReferenceTable => {
                write!(f, "reference table has no colors")
            }
        }
    }
}

impl std::error::Error for QuantizeError {}

/// Error returned by [`ReferenceColor::from_hex`](crate::ReferenceColor::from_hex).
#[derive(Debug, Clone, PartialEq)]
pub enum ParseColorError {
    /// Digit count after the optional `#` was neither 3 nor 6
    InvalidLength(usize),
    /// A digit was not hexadecimal
    InvalidHex(ParseIntError),
}

impl From<ParseIntError> for ParseColorError {
    fn from(err: ParseIntError) -> Self {
        ParseColorError::InvalidHex(err)
    }
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseColorError::InvalidLength(len) => {
                write!(f, "hex color needs 3 or 6 digits, got {}", len)
            }
            ParseColorError::InvalidHex(err) => write!(f, "bad hex digit: {}", err),
        }
    }
}

impl std::error::Error for ParseColorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseColorError::InvalidHex(err) => Some(err),
            ParseColorError::InvalidLength(_) => None,
        }
    }
}
