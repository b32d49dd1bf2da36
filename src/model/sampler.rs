//! # Target Length Sampler
//!
//! Draws a target packet length for a source length by walking the
//! cumulative distribution of the source length's column.
//!
//! The walk adds the next weight while `r >= cdf` and entries remain, so the
//! first entry is always consumed, even for `r = 0` and a leading zero weight.
//! A column whose mass falls short of `r` yields its last stored row.

use rand::Rng;

use crate::data::csc::MorphingMatrix;
use crate::error::{DreamError, Result};

/// Target length (one-based) for `source_length` (one-based) given a draw `r` in `[0, 1]`
pub fn sample(matrix: &MorphingMatrix, source_length: usize, r: f64) -> Result<usize> {
    if !(0.0..=1.0).contains(&r) {
        return Err(DreamError::invalid_argument(
            "r",
            format!("random draw {} is outside [0, 1]", r),
        ));
    }

    let column = source_length
        .checked_sub(1)
        .and_then(|c| matrix.column(c))
        .ok_or_else(|| {
            DreamError::invalid_argument(
                "source_length",
                format!(
                    "length {} is outside [1, {}]",
                    source_length,
                    matrix.size()
                ),
            )
        })?;

    let values = column.values();
    let mut cdf = 0.0;
    let mut i = 0;
    while r >= cdf && i < values.len() {
        cdf += values[i];
        i += 1;
    }

    // Columns are never empty, so the loop ran at least once
    Ok(column.rows()[i - 1] + 1)
}

/// Like [`sample`], drawing `r` uniformly from `rng`
pub fn sample_with_rng<R: Rng + ?Sized>(
    matrix: &MorphingMatrix,
    source_length: usize,
    rng: &mut R,
) -> Result<usize> {
    sample(matrix, source_length, rng.random::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rand::SeedableRng;

    /// Length 1 -> {1: 0.3, 3: 0.7}; length 2 -> {2: 0.5} (light); length 3 -> {1: 0.0, 2: 1.0}
    fn make_matrix() -> MorphingMatrix {
        MorphingMatrix::from_parts(
            3,
            vec![0.3, 0.7, 0.5, 0.0, 1.0],
            vec![0, 2, 1, 0, 1],
            vec![0, 2, 3, 5],
        )
        .unwrap()
    }

    #[test]
    fn test_cdf_boundaries() {
        let m = make_matrix();
        assert_eq!(sample(&m, 1, 0.0).unwrap(), 1);
        assert_eq!(sample(&m, 1, 0.29).unwrap(), 1);
        assert_eq!(sample(&m, 1, 0.3).unwrap(), 3);
        assert_eq!(sample(&m, 1, 0.99).unwrap(), 3);
        assert_eq!(sample(&m, 1, 1.0).unwrap(), 3);
    }

    #[test]
    fn test_zero_draw_skips_leading_zero_weight() {
        let m = make_matrix();
        // cdf after the first entry is still 0, so r = 0 keeps walking
        assert_eq!(sample(&m, 3, 0.0).unwrap(), 2);
    }

    #[test]
    fn test_light_column_falls_back_to_last_row() {
        let m = make_matrix();
        assert_eq!(sample(&m, 2, 0.9).unwrap(), 2);
    }

    #[test]
    fn test_range_rejection() {
        let m = make_matrix();
        let cases = [(0, 0.5), (4, 0.5), (1, 1.5), (1, -0.1), (1, f64::NAN)];
        for (len, r) in cases {
            let err = sample(&m, len, r).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "len={} r={}", len, r);
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let m = make_matrix();
        let mut a = rand::rngs::StdRng::seed_from_u64(42);
        let mut b = rand::rngs::StdRng::seed_from_u64(42);

        for _ in 0..32 {
            let x = sample_with_rng(&m, 1, &mut a).unwrap();
            let y = sample_with_rng(&m, 1, &mut b).unwrap();
            assert_eq!(x, y);
            assert!(x == 1 || x == 3);
        }
    }

    #[test]
    fn test_sampled_frequencies_follow_column() {
        let m = make_matrix();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let n = 20_000;
        let threes = (0..n)
            .filter(|_| sample_with_rng(&m, 1, &mut rng).unwrap() == 3)
            .count();
        let freq = threes as f64 / n as f64;
        assert!((freq - 0.7).abs() < 0.02, "freq = {}", freq);
    }
}
