//! # Coordinate to Compressed-Column Converter
//!
//! ## Role
//! Turns an unordered list of one-based `(row, col, value)` triples into a
//! [`MorphingMatrix`], enforcing the morphing-matrix rules along the way.
//!
//! ## Algorithm
//! 1. Check the declared dimensions: square, positive, at least one entry.
//! 2. Read and normalize all `nz_entries` triples.
//! 3. Sort by `(col, row)`. Duplicate coordinates are ordered by value so
//!    any permutation of the same input packs to identical arrays.
//! 4. Walk the sorted triples once, copying rows and values and opening a
//!    new column boundary each time the column advances. A column may only
//!    advance by one: morphing matrices have no empty columns.
//! 5. Close with a final boundary at `nz_entries` and require exactly
//!    `cols_n + 1` boundaries.
//!
//! Based on the COO-to-CSC conversion of the Berkeley BeBOP sparse matrix
//! converter. Any error drops the triple buffer and the partial builder.

use std::cmp::Ordering;

use tracing::{debug, info_span, trace};

use crate::data::csc::{CscBuilder, MorphingMatrix};
use crate::data::distribution::DEFAULT_MASS_TOLERANCE;
use crate::data::triple::{CoordinateTriple, RawTriple};
use crate::error::{DreamError, Result};

/// Supplier of literal one-based triples, positioned past the header
pub trait TripleSource {
    /// Next triple exactly as written in the input
    fn next_triple(&mut self) -> Result<RawTriple>;

    /// Called once all declared triples have been read
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory triples; running dry is a short read, leftovers are trailing data
impl<I: Iterator<Item = RawTriple>> TripleSource for I {
    fn next_triple(&mut self) -> Result<RawTriple> {
        self.next()
            .ok_or_else(|| DreamError::corrupted("fewer entries than declared"))
    }

    fn finish(&mut self) -> Result<()> {
        match self.next() {
            Some(_) => Err(DreamError::corrupted("more entries than declared")),
            None => Ok(()),
        }
    }
}

/// Conversion knobs
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvertOptions {
    /// Reject matrices whose columns do not sum to 1
    pub strict_mass: bool,
    /// Allowed deviation from 1 when `strict_mass` is set
    pub mass_tolerance: f64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            strict_mass: false,
            mass_tolerance: DEFAULT_MASS_TOLERANCE,
        }
    }
}

impl ConvertOptions {
    pub fn strict() -> Self {
        Self {
            strict_mass: true,
            ..Self::default()
        }
    }
}

/// Convert with default options
pub fn convert<S: TripleSource + ?Sized>(
    source: &mut S,
    rows_n: i64,
    cols_n: i64,
    nz_entries: i64,
) -> Result<MorphingMatrix> {
    convert_with(source, rows_n, cols_n, nz_entries, &ConvertOptions::default())
}

/// Read `nz_entries` triples from `source` and pack them into a morphing matrix
pub fn convert_with<S: TripleSource + ?Sized>(
    source: &mut S,
    rows_n: i64,
    cols_n: i64,
    nz_entries: i64,
    options: &ConvertOptions,
) -> Result<MorphingMatrix> {
    info_span!("convert", rows_n, cols_n, nz_entries).in_scope(|| {
        if cols_n <= 0 || rows_n != cols_n || nz_entries <= 0 {
            return Err(DreamError::not_morphing(format!(
                "declared {}x{} with {} entries; need a nonempty square matrix",
                rows_n, cols_n, nz_entries
            )));
        }
        let size = usize::try_from(cols_n)
            .map_err(|_| DreamError::internal(format!("{} columns do not fit in memory", cols_n)))?;
        let nz = usize::try_from(nz_entries).map_err(|_| {
            DreamError::internal(format!("{} entries do not fit in memory", nz_entries))
        })?;

        let triples = read_sorted_triples(source, size, nz)?;
        let matrix = pack(&triples, size)?;

        if options.strict_mass {
            matrix.check_mass(options.mass_tolerance)?;
        }

        debug!(
            size = matrix.size(),
            entries = matrix.entries_n(),
            "packed morphing matrix"
        );
        Ok(matrix)
    })
}

/// Read, validate and order all triples
fn read_sorted_triples<S: TripleSource + ?Sized>(
    source: &mut S,
    size: usize,
    nz: usize,
) -> Result<Vec<CoordinateTriple>> {
    let mut triples = Vec::new();
    triples.try_reserve_exact(nz)?;

    for _ in 0..nz {
        let raw = source.next_triple()?;
        triples.push(CoordinateTriple::from_one_based(raw, size)?);
    }
    source.finish()?;

    triples.sort_unstable_by(compare_col_major);
    Ok(triples)
}

/// Column-major order with a total tie-break
fn compare_col_major(a: &CoordinateTriple, b: &CoordinateTriple) -> Ordering {
    a.col
        .cmp(&b.col)
        .then(a.row.cmp(&b.row))
        .then(a.value.total_cmp(&b.value))
}

/// Pack col-major sorted triples into CSC arrays
fn pack(triples: &[CoordinateTriple], size: usize) -> Result<MorphingMatrix> {
    let first = triples
        .first()
        .ok_or_else(|| DreamError::not_morphing("matrix has no entries"))?;

    // Without this a missing leading column would shift every boundary by one
    if first.col != 0 {
        return Err(DreamError::not_morphing(format!(
            "no entries for length 1; first populated length is {}",
            first.col + 1
        )));
    }

    let nz = triples.len();
    let mut builder = CscBuilder::new(size, nz)?;

    let mut cur_col = first.col;
    builder.push_boundary(cur_col);

    for (i, t) in triples.iter().enumerate() {
        if t.col > cur_col {
            if t.col - cur_col != 1 {
                return Err(DreamError::not_morphing(format!(
                    "no entries for length {}",
                    cur_col + 2
                )));
            }

            cur_col = t.col;
            let n_boundaries = builder.push_boundary(i);
            trace!(col = cur_col, start = i, "column boundary");

            if n_boundaries > size {
                return Err(DreamError::corrupted(format!(
                    "more than the {} declared columns are populated",
                    size
                )));
            }
        }

        builder.push_entry(t.row, t.value);
    }

    builder.push_boundary(nz);

    if builder.n_boundaries() != size + 1 {
        return Err(DreamError::not_morphing(format!(
            "only {} of {} lengths have entries",
            builder.n_boundaries() - 1,
            size
        )));
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn triples(list: &[(i64, i64, f64)]) -> std::vec::IntoIter<RawTriple> {
        list.iter()
            .map(|&(r, c, v)| RawTriple::new(r, c, v))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_two_by_two() {
        let mut src = triples(&[(1, 1, 0.5), (1, 2, 0.5), (2, 1, 1.0)]);
        let m = convert(&mut src, 2, 2, 3).unwrap();

        assert_eq!(m.values(), &[0.5, 1.0, 0.5]);
        assert_eq!(m.row_inds(), &[0, 1, 0]);
        assert_eq!(m.col_ptrs(), &[0, 2, 3]);
        assert_eq!(m.size(), 2);
        assert_eq!(m.entries_n(), 3);
    }

    #[test]
    fn test_rows_sorted_within_column() {
        let mut src = triples(&[(3, 1, 0.2), (1, 1, 0.3), (2, 2, 1.0), (2, 1, 0.5), (3, 3, 1.0)]);
        let m = convert(&mut src, 3, 3, 5).unwrap();

        assert_eq!(m.row_inds(), &[0, 1, 2, 1, 2]);
        assert_eq!(m.values(), &[0.3, 0.5, 0.2, 1.0, 1.0]);
        assert_eq!(m.col_ptrs(), &[0, 3, 4, 5]);
    }

    #[test]
    fn test_non_square_rejected() {
        let mut src = triples(&[(1, 1, 1.0)]);
        let err = convert(&mut src, 2, 3, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_non_positive_dimensions_rejected() {
        for (r, c, nz) in [(0, 0, 1), (-1, -1, 1), (2, 2, 0), (2, 2, -4)] {
            let mut src = triples(&[(1, 1, 1.0)]);
            let err = convert(&mut src, r, c, nz).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotMorphing, "{}x{} nz={}", r, c, nz);
        }
    }

    #[test]
    fn test_gap_rejected() {
        // Columns 1 and 3 present, column 2 absent
        let mut src = triples(&[(1, 1, 1.0), (2, 3, 1.0)]);
        let err = convert(&mut src, 3, 3, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_missing_trailing_column_rejected() {
        let mut src = triples(&[(1, 1, 0.5), (2, 1, 0.5), (1, 2, 1.0)]);
        let err = convert(&mut src, 3, 3, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_missing_leading_column_rejected() {
        let mut src = triples(&[(1, 2, 1.0), (1, 3, 1.0)]);
        let err = convert(&mut src, 3, 3, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut src = triples(&[(1, 1, 1.0), (1, 2, -0.5)]);
        let err = convert(&mut src, 2, 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);
    }

    #[test]
    fn test_short_read_is_corrupted() {
        let mut src = triples(&[(1, 1, 1.0)]);
        let err = convert(&mut src, 2, 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_extra_entries_are_corrupted() {
        let mut src = triples(&[(1, 1, 1.0), (1, 1, 5.0)]);
        let err = convert(&mut src, 1, 1, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
        assert!(err.to_string().contains("more entries than declared"));
    }

    #[test]
    fn test_oversized_entry_count_is_internal() {
        let mut src = triples(&[]);
        let err = convert(&mut src, 2, 2, i64::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_oversized_dimension_is_internal() {
        let mut src = triples(&[(1, 1, 1.0)]);
        let err = convert(&mut src, i64::MAX, i64::MAX, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_permutations_pack_identically() {
        let base = [
            (1, 1, 0.1),
            (3, 1, 0.9),
            (2, 2, 0.4),
            (3, 2, 0.6),
            (1, 3, 1.0),
        ];
        let mut reference = triples(&base);
        let expected = convert(&mut reference, 3, 3, 5).unwrap();

        let mut reversed = base;
        reversed.reverse();
        let mut rotated = base;
        rotated.rotate_left(2);

        for order in [reversed, rotated] {
            let mut src = triples(&order);
            let m = convert(&mut src, 3, 3, 5).unwrap();
            assert_eq!(m.values(), expected.values());
            assert_eq!(m.row_inds(), expected.row_inds());
            assert_eq!(m.col_ptrs(), expected.col_ptrs());
        }
    }

    #[test]
    fn test_duplicate_coordinates_order_by_value() {
        let mut a = triples(&[(1, 1, 0.7), (1, 1, 0.3)]);
        let mut b = triples(&[(1, 1, 0.3), (1, 1, 0.7)]);
        let ma = convert(&mut a, 1, 1, 2).unwrap();
        let mb = convert(&mut b, 1, 1, 2).unwrap();
        assert_eq!(ma.values(), &[0.3, 0.7]);
        assert_eq!(ma, mb);
    }

    #[test]
    fn test_strict_mass() {
        let mut src = triples(&[(1, 1, 0.5), (1, 2, 0.5), (2, 1, 1.0)]);
        let err = convert_with(&mut src, 2, 2, 3, &ConvertOptions::strict()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMorphing);

        let mut src = triples(&[(1, 1, 0.25), (2, 1, 0.75), (2, 2, 1.0)]);
        assert!(convert_with(&mut src, 2, 2, 3, &ConvertOptions::strict()).is_ok());
    }

    #[test]
    fn test_structural_invariants_hold() {
        let mut src = triples(&[
            (4, 1, 0.25),
            (1, 1, 0.75),
            (2, 2, 1.0),
            (4, 3, 0.5),
            (3, 3, 0.5),
            (1, 4, 0.125),
            (4, 4, 0.875),
        ]);
        let m = convert(&mut src, 4, 4, 7).unwrap();

        assert_eq!(m.col_ptrs()[m.size()], m.entries_n());
        for c in 0..m.size() {
            assert!(m.col_ptrs()[c + 1] > m.col_ptrs()[c]);
        }
        assert!(m.row_inds().iter().all(|&r| r < m.size()));
    }
}
