//! # Packet-Length Distributions
//!
//! A probability distribution over packet lengths `1..=N`, loaded from the
//! plain-text files used to describe observed traffic:
//!
//! ```text
//! # comment
//! 1: 0.024
//! 2: 0.005
//! 3: 0.156
//! ```
//!
//! Lengths must appear in order starting at 1 with no gaps. The colon after
//! the length is optional.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::Rng;
use tracing::info_span;

use crate::error::{DreamError, Result};

/// Default tolerance on the total mass of a distribution
pub const DEFAULT_MASS_TOLERANCE: f64 = 1e-4;

/// Probabilities indexed by zero-based packet length
#[derive(Clone, Debug, PartialEq)]
pub struct PacketDistribution {
    probs: Vec<f64>,
}

impl PacketDistribution {
    /// Build from probabilities for lengths `1..=probs.len()`
    pub fn from_probabilities(probs: Vec<f64>) -> Result<Self> {
        if probs.is_empty() {
            return Err(DreamError::invalid_argument("probs", "empty distribution"));
        }
        if let Some((i, p)) = probs
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.is_finite() && **p >= 0.0))
        {
            return Err(DreamError::invalid_argument(
                "probs",
                format!("probability {} for length {} is not in [0, inf)", p, i + 1),
            ));
        }
        Ok(Self { probs })
    }

    /// Load from a distribution file
    pub fn open(path: &Path) -> Result<Self> {
        info_span!("distribution_open", path = ?path).in_scope(|| {
            let file = File::open(path)?;
            Self::from_reader(BufReader::new(file))
        })
    }

    /// Parse a distribution from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut probs = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(DreamError::corrupted_at(
                    line_num + 1,
                    format!("expected `<length>: <probability>`, got {} fields", parts.len()),
                ));
            }

            let expected = probs.len() + 1;
            let len: usize = parts[0]
                .trim_end_matches(':')
                .parse()
                .map_err(|_| DreamError::corrupted_at(line_num + 1, "Invalid packet length"))?;
            if len != expected {
                return Err(DreamError::corrupted_at(
                    line_num + 1,
                    format!("expected length {}, got {}", expected, len),
                ));
            }

            let p: f64 = parts[1]
                .parse()
                .map_err(|_| DreamError::corrupted_at(line_num + 1, "Invalid probability"))?;
            if !(p.is_finite() && p >= 0.0) {
                return Err(DreamError::corrupted_at(
                    line_num + 1,
                    format!("probability {} is not in [0, inf)", p),
                ));
            }

            probs.push(p);
        }

        if probs.is_empty() {
            return Err(DreamError::corrupted("distribution file has no entries"));
        }

        Ok(Self { probs })
    }

    /// Number of packet lengths covered
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Probability of one-based `length`
    pub fn probability(&self, length: usize) -> Option<f64> {
        length.checked_sub(1).and_then(|i| self.probs.get(i).copied())
    }

    /// Probabilities indexed by zero-based length
    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    /// Total mass
    pub fn total(&self) -> f64 {
        self.probs.iter().sum()
    }

    /// Draw a one-based length with probability proportional to its weight
    pub fn sample_length<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let mut threshold = rng.random::<f64>() * self.total();
        for (i, p) in self.probs.iter().enumerate() {
            threshold -= *p;
            if threshold < 0.0 {
                return i + 1;
            }
        }
        // Rounding left the draw at the total
        self.probs
            .iter()
            .rposition(|&p| p > 0.0)
            .map_or(self.probs.len(), |i| i + 1)
    }

    /// Require the total mass to lie strictly within `1 ± tolerance`
    pub fn check_mass(&self, tolerance: f64) -> Result<()> {
        let total = self.total();
        if (1.0 - tolerance) < total && total < (1.0 + tolerance) {
            Ok(())
        } else {
            Err(DreamError::invalid_argument(
                "distribution",
                format!("probabilities sum to {}, not 1", total),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_with_comments() {
        let text = "# source\n1: 0.25\n\n2: 0.25\n3 0.5\n";
        let d = PacketDistribution::from_reader(text.as_bytes()).unwrap();
        assert_eq!(d.len(), 3);
        assert_eq!(d.probability(1), Some(0.25));
        assert_eq!(d.probability(3), Some(0.5));
        assert_eq!(d.probability(0), None);
        assert_eq!(d.probability(4), None);
        assert!(d.check_mass(DEFAULT_MASS_TOLERANCE).is_ok());
    }

    #[test]
    fn test_gap_in_lengths_rejected() {
        let err = PacketDistribution::from_reader("1: 0.5\n3: 0.5\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_bad_probability_rejected() {
        let err = PacketDistribution::from_reader("1: abc\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);

        let err = PacketDistribution::from_reader("1: -0.5\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_empty_file_rejected() {
        let err = PacketDistribution::from_reader("# nothing\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
    }

    #[test]
    fn test_check_mass_fails_for_light_distribution() {
        let d = PacketDistribution::from_probabilities(vec![0.2, 0.2]).unwrap();
        let err = d.check_mass(DEFAULT_MASS_TOLERANCE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_from_probabilities_validates() {
        assert!(PacketDistribution::from_probabilities(vec![]).is_err());
        assert!(PacketDistribution::from_probabilities(vec![0.5, f64::NAN]).is_err());
    }

    #[test]
    fn test_sample_length_skips_zero_mass() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let d = PacketDistribution::from_probabilities(vec![0.0, 0.3, 0.0, 0.7]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 5];
        for _ in 0..2000 {
            counts[d.sample_length(&mut rng)] += 1;
        }
        assert_eq!(counts[0], 0);
        assert_eq!(counts[1], 0);
        assert_eq!(counts[3], 0);
        assert!(counts[2] > 400 && counts[2] < 800, "{:?}", counts);
        assert_eq!(counts[2] + counts[4], 2000);
    }
}
