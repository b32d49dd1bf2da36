//! # Coordinate Triples
//!
//! ## Role
//! Transient `(row, col, value)` records read from a coordinate-format body.
//! They exist only while the converter runs.
//!
//! ## Numbering
//! - `RawTriple` is exactly what the input said: one-based, signed, unchecked.
//! - `CoordinateTriple` is normalized: zero-based, inside the declared
//!   dimensions, with a finite nonnegative weight.

use crate::error::{DreamError, Result};

/// A triple as read from the input, one-based and unchecked
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawTriple {
    pub row: i64,
    pub col: i64,
    pub value: f64,
}

impl RawTriple {
    pub fn new(row: i64, col: i64, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// A validated, zero-based matrix entry
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateTriple {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl CoordinateTriple {
    /// Normalize a one-based triple for an `size`x`size` matrix
    ///
    /// Negative coordinates or weights (after the shift to zero-based) are a
    /// domain violation. Coordinates past the declared dimensions mean the body
    /// disagrees with its own header.
    pub fn from_one_based(raw: RawTriple, size: usize) -> Result<Self> {
        let row = raw.row.saturating_sub(1);
        let col = raw.col.saturating_sub(1);

        if row < 0 || col < 0 || raw.value < 0.0 {
            return Err(DreamError::not_morphing(format!(
                "entry ({}, {}, {}) has a negative coordinate or weight",
                raw.row, raw.col, raw.value
            )));
        }
        if !raw.value.is_finite() {
            return Err(DreamError::not_morphing(format!(
                "entry ({}, {}) has a non-finite weight",
                raw.row, raw.col
            )));
        }

        let (row, col) = (row as u64, col as u64);
        if row >= size as u64 || col >= size as u64 {
            return Err(DreamError::corrupted(format!(
                "entry ({}, {}) lies outside the declared {}x{} matrix",
                raw.row, raw.col, size, size
            )));
        }

        Ok(Self {
            row: row as usize,
            col: col as usize,
            value: raw.value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_shift_to_zero_based() {
        let t = CoordinateTriple::from_one_based(RawTriple::new(3, 1, 0.25), 4).unwrap();
        assert_eq!(t.row, 2);
        assert_eq!(t.col, 0);
        assert_eq!(t.value, 0.25);
    }

    #[test]
    fn test_zero_coordinate_rejected() {
        let err = CoordinateTriple::from_one_based(RawTriple::new(0, 1, 0.5), 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);

        let err = CoordinateTriple::from_one_based(RawTriple::new(1, -2, 0.5), 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = CoordinateTriple::from_one_based(RawTriple::new(1, 1, -0.1), 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_nan_weight_rejected() {
        let err =
            CoordinateTriple::from_one_based(RawTriple::new(1, 1, f64::NAN), 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_zero_weight_allowed() {
        assert!(CoordinateTriple::from_one_based(RawTriple::new(1, 1, 0.0), 1).is_ok());
    }

    #[test]
    fn test_out_of_bounds_is_corrupted() {
        let err = CoordinateTriple::from_one_based(RawTriple::new(5, 1, 0.5), 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }
}
