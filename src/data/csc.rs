//! # Compressed-Column Morphing Matrix
//!
//! ## Role
//! The persistent structure: an NxN matrix where N is the number of packet
//! lengths modeled. Column `c` is the distribution of target lengths for
//! source length `c + 1`.
//!
//! ## Layout
//! ```text
//! values:   [ v0 v1 | v2 | v3 v4 v5 ]   entries_n weights
//! row_inds: [ r0 r1 | r2 | r3 r4 r5 ]   parallel to values
//! col_ptrs: [ 0      2    3          6 ] size + 1 boundaries
//! ```
//!
//! ## Invariants
//! - `col_ptrs[size] == entries_n`
//! - every column holds at least one entry (morphing matrices have no
//!   empty columns)
//! - `col_ptrs` is non-decreasing
//! - every row index lies in `[0, size)`
//!
//! Column masses are expected to sum to ~1.0 but this is not enforced here;
//! see `check_mass`.
//!
//! The matrix is immutable once built. Dropping it (or calling `release`)
//! frees the three arrays.

use std::ops::Range;
use std::path::Path;

use rand::Rng;

use crate::error::{DreamError, Result};
use crate::model::converter::ConvertOptions;
use crate::model::sampler;

/// Square sparse matrix in Compressed Sparse Column format
#[derive(Clone, Debug, PartialEq)]
pub struct MorphingMatrix {
    /// Number of rows and columns
    size: usize,

    /// Nonzero weights, column by column
    values: Vec<f64>,

    /// Zero-based row of each weight
    row_inds: Vec<usize>,

    /// `col_ptrs[c]..col_ptrs[c + 1]` bounds column `c`
    col_ptrs: Vec<usize>,
}

/// Borrowed view of one column
#[derive(Clone, Copy, Debug)]
pub struct Column<'a> {
    rows: &'a [usize],
    values: &'a [f64],
}

impl<'a> Column<'a> {
    /// Zero-based rows in stored order
    pub fn rows(&self) -> &'a [usize] {
        self.rows
    }

    /// Weights in stored order
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of the column's weights
    pub fn mass(&self) -> f64 {
        self.values.iter().sum()
    }

    /// `(zero-based row, weight)` pairs in stored order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.rows.iter().copied().zip(self.values.iter().copied())
    }
}

impl MorphingMatrix {
    /// Assemble a matrix from raw CSC arrays, checking every structural invariant
    pub fn from_parts(
        size: usize,
        values: Vec<f64>,
        row_inds: Vec<usize>,
        col_ptrs: Vec<usize>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(DreamError::not_morphing("matrix has no columns"));
        }
        if values.is_empty() {
            return Err(DreamError::not_morphing("matrix has no entries"));
        }
        if values.len() != row_inds.len() {
            return Err(DreamError::corrupted(format!(
                "{} values but {} row indices",
                values.len(),
                row_inds.len()
            )));
        }
        if col_ptrs.len() != size + 1 {
            return Err(DreamError::corrupted(format!(
                "expected {} column boundaries, got {}",
                size + 1,
                col_ptrs.len()
            )));
        }
        if col_ptrs[0] != 0 || col_ptrs[size] != values.len() {
            return Err(DreamError::corrupted(
                "column boundaries do not span the entry arrays",
            ));
        }
        if let Some(c) = col_ptrs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DreamError::not_morphing(format!(
                "column {} has no entries",
                c + 1
            )));
        }
        if let Some(&row) = row_inds.iter().find(|&&r| r >= size) {
            return Err(DreamError::corrupted(format!(
                "row index {} outside a {}x{} matrix",
                row + 1,
                size,
                size
            )));
        }
        if let Some(v) = values.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(DreamError::not_morphing(format!(
                "weight {} is not a probability",
                v
            )));
        }

        Ok(Self {
            size,
            values,
            row_inds,
            col_ptrs,
        })
    }

    /// Number of packet lengths modeled (N of the NxN matrix)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of stored weights
    pub fn entries_n(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row_inds(&self) -> &[usize] {
        &self.row_inds
    }

    pub fn col_ptrs(&self) -> &[usize] {
        &self.col_ptrs
    }

    /// Position range of zero-based column `c` within `values`/`row_inds`
    #[inline]
    pub fn column_bounds(&self, c: usize) -> Option<Range<usize>> {
        if c >= self.size {
            return None;
        }
        Some(self.col_ptrs[c]..self.col_ptrs[c + 1])
    }

    /// `(zero-based row, weight)` stored at position `i`
    #[inline]
    pub fn entry(&self, i: usize) -> Option<(usize, f64)> {
        Some((*self.row_inds.get(i)?, *self.values.get(i)?))
    }

    /// View of zero-based column `c`
    #[inline]
    pub fn column(&self, c: usize) -> Option<Column<'_>> {
        let bounds = self.column_bounds(c)?;
        Some(Column {
            rows: &self.row_inds[bounds.clone()],
            values: &self.values[bounds],
        })
    }

    /// Iterate all columns in order
    pub fn columns(&self) -> impl Iterator<Item = Column<'_>> + '_ {
        (0..self.size).filter_map(move |c| self.column(c))
    }

    /// Require every column mass to lie strictly within `1 ± tolerance`
    pub fn check_mass(&self, tolerance: f64) -> Result<()> {
        for (c, column) in self.columns().enumerate() {
            let mass = column.mass();
            if !((1.0 - tolerance) < mass && mass < (1.0 + tolerance)) {
                return Err(DreamError::not_morphing(format!(
                    "column for length {} sums to {}, not 1",
                    c + 1,
                    mass
                )));
            }
        }
        Ok(())
    }

    /// Give up the matrix and its arrays
    pub fn release(self) {
        drop(self);
    }

    /// Approximate heap footprint in bytes
    pub fn size_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
            + self.row_inds.len() * std::mem::size_of::<usize>()
            + self.col_ptrs.len() * std::mem::size_of::<usize>()
            + std::mem::size_of::<Self>()
    }
}

// ============================================================================
// Convenience entry points
// ============================================================================

impl MorphingMatrix {
    /// Load a morphing matrix from a Matrix Market file
    pub fn open(path: &Path, options: &ConvertOptions) -> Result<Self> {
        crate::io::matrix_market::open(path, options)
    }

    /// One-based target length for one-based `source_length` and draw `r`
    pub fn target_length(&self, source_length: usize, r: f64) -> Result<usize> {
        sampler::sample(self, source_length, r)
    }

    /// Like `target_length`, drawing `r` from `rng`
    pub fn target_length_with<R: Rng + ?Sized>(
        &self,
        source_length: usize,
        rng: &mut R,
    ) -> Result<usize> {
        sampler::sample_with_rng(self, source_length, rng)
    }
}

// ============================================================================
// Builder used by the converter
// ============================================================================

/// Partially built matrix
///
/// Arrays are reserved up front with fallible allocation and filled by a
/// single forward walk. Dropping a builder on an error path frees whatever
/// was filled so far.
#[derive(Debug)]
pub(crate) struct CscBuilder {
    size: usize,
    entries_n: usize,
    values: Vec<f64>,
    row_inds: Vec<usize>,
    col_ptrs: Vec<usize>,
}

impl CscBuilder {
    /// Reserve a square matrix of `size` columns and `entries_n` entries
    pub(crate) fn new(size: usize, entries_n: usize) -> Result<Self> {
        let n_ptrs = size
            .checked_add(1)
            .ok_or_else(|| DreamError::internal("column count overflows"))?;

        let mut values = Vec::new();
        values.try_reserve_exact(entries_n)?;
        let mut row_inds = Vec::new();
        row_inds.try_reserve_exact(entries_n)?;
        let mut col_ptrs = Vec::new();
        col_ptrs.try_reserve_exact(n_ptrs)?;

        Ok(Self {
            size,
            entries_n,
            values,
            row_inds,
            col_ptrs,
        })
    }

    #[inline]
    pub(crate) fn push_entry(&mut self, row: usize, value: f64) {
        self.row_inds.push(row);
        self.values.push(value);
    }

    /// Record a column boundary and return how many are recorded
    #[inline]
    pub(crate) fn push_boundary(&mut self, pos: usize) -> usize {
        self.col_ptrs.push(pos);
        self.col_ptrs.len()
    }

    pub(crate) fn n_boundaries(&self) -> usize {
        self.col_ptrs.len()
    }

    pub(crate) fn finish(self) -> MorphingMatrix {
        debug_assert_eq!(self.values.len(), self.entries_n);
        debug_assert_eq!(self.col_ptrs.len(), self.size + 1);
        debug_assert_eq!(self.col_ptrs.last().copied(), Some(self.entries_n));

        MorphingMatrix {
            size: self.size,
            values: self.values,
            row_inds: self.row_inds,
            col_ptrs: self.col_ptrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn make_matrix() -> MorphingMatrix {
        // 3x3: length 1 -> {1: 0.3, 3: 0.7}, length 2 -> {2: 1.0}, length 3 -> {1: 0.5, 3: 0.5}
        MorphingMatrix::from_parts(
            3,
            vec![0.3, 0.7, 1.0, 0.5, 0.5],
            vec![0, 2, 1, 0, 2],
            vec![0, 2, 3, 5],
        )
        .expect("valid matrix")
    }

    #[test]
    fn test_accessors() {
        let m = make_matrix();
        assert_eq!(m.size(), 3);
        assert_eq!(m.entries_n(), 5);
        assert_eq!(m.column_bounds(0), Some(0..2));
        assert_eq!(m.column_bounds(2), Some(3..5));
        assert_eq!(m.column_bounds(3), None);
        assert_eq!(m.entry(1), Some((2, 0.7)));
        assert_eq!(m.entry(5), None);
    }

    #[test]
    fn test_column_view() {
        let m = make_matrix();
        let col = m.column(0).unwrap();
        assert_eq!(col.rows(), &[0, 2]);
        assert_eq!(col.values(), &[0.3, 0.7]);
        assert!((col.mass() - 1.0).abs() < 1e-12);
        assert_eq!(col.iter().collect::<Vec<_>>(), vec![(0, 0.3), (2, 0.7)]);
        assert!(m.column(3).is_none());
        assert_eq!(m.columns().count(), 3);
    }

    #[test]
    fn test_empty_column_rejected() {
        let err = MorphingMatrix::from_parts(2, vec![1.0, 1.0], vec![0, 1], vec![0, 2, 2])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_row_out_of_range_rejected() {
        let err = MorphingMatrix::from_parts(1, vec![1.0], vec![1], vec![0, 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_boundary_mismatch_rejected() {
        let err = MorphingMatrix::from_parts(2, vec![1.0, 1.0], vec![0, 1], vec![0, 1, 3])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_check_mass() {
        let m = make_matrix();
        assert!(m.check_mass(1e-4).is_ok());

        let light = MorphingMatrix::from_parts(1, vec![0.5], vec![0], vec![0, 1]).unwrap();
        let err = light.check_mass(1e-4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_builder_finish() {
        let mut b = CscBuilder::new(2, 3).unwrap();
        assert_eq!(b.push_boundary(0), 1);
        b.push_entry(0, 0.5);
        b.push_entry(1, 0.5);
        b.push_boundary(2);
        b.push_entry(1, 1.0);
        b.push_boundary(3);
        assert_eq!(b.n_boundaries(), 3);

        let m = b.finish();
        assert_eq!(m.col_ptrs(), &[0, 2, 3]);
        assert_eq!(m.row_inds(), &[0, 1, 1]);
    }

    #[test]
    fn test_release() {
        make_matrix().release();
    }
}
