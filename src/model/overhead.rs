//! # Morphing Overhead
//!
//! ## Role
//! Measures what a morphing matrix costs when applied to traffic with a given
//! source length distribution.
//!
//! ## Formulas
//! For a source distribution `s` and matrix `M`:
//! ```text
//! overhead = sum_c s[c] * sum_{(r, p) in column c} p * |r - c|
//! padding  = sum_c s[c] * sum_{(r, p) in column c, r > c} p * (r - c)
//! target   = M * s
//! ```
//! `overhead` is the objective minimized when a morphing matrix is solved
//! for; `padding` only counts bytes added. Lengths are in bytes, so both are
//! expected bytes per packet.
//!
//! ## Gain Simulation
//! [`simulate_gain`] sends packets drawn from the source distribution two
//! ways. *Sampling* draws every target length from the target distribution;
//! *morphing* takes the first target from the matrix column and any later
//! ones from the target distribution. A target at least as long as what is
//! left of the packet pads it and ends the packet. A shorter target sends
//! that many bytes and costs a split penalty.

use rand::Rng;
use tracing::{debug, info_span, trace};

use crate::data::csc::MorphingMatrix;
use crate::data::distribution::{PacketDistribution, DEFAULT_MASS_TOLERANCE};
use crate::error::{DreamError, Result};
use crate::model::sampler;

/// Bytes charged each time a packet is split
pub const DEFAULT_SPLIT_PENALTY: u64 = 50;

fn check_sizes(matrix: &MorphingMatrix, source: &PacketDistribution) -> Result<()> {
    if source.len() != matrix.size() {
        return Err(DreamError::invalid_argument(
            "source",
            format!(
                "distribution covers {} lengths but the matrix models {}",
                source.len(),
                matrix.size()
            ),
        ));
    }
    Ok(())
}

/// Expected absolute length change per packet
pub fn expected_overhead(matrix: &MorphingMatrix, source: &PacketDistribution) -> Result<f64> {
    check_sizes(matrix, source)?;
    Ok(per_column(matrix, source, |row, col| row.abs_diff(col) as f64))
}

/// Expected bytes added per packet
pub fn expected_padding(matrix: &MorphingMatrix, source: &PacketDistribution) -> Result<f64> {
    check_sizes(matrix, source)?;
    Ok(per_column(matrix, source, |row, col| {
        row.saturating_sub(col) as f64
    }))
}

/// Source-weighted sum of `p * cost(row, col)` over every stored entry
fn per_column(
    matrix: &MorphingMatrix,
    source: &PacketDistribution,
    cost: impl Fn(usize, usize) -> f64,
) -> f64 {
    matrix
        .columns()
        .zip(source.probabilities())
        .enumerate()
        .map(|(col, (column, &s))| {
            s * column.iter().map(|(row, p)| p * cost(row, col)).sum::<f64>()
        })
        .sum()
}

/// Distribution of morphed lengths, `M * s`
pub fn target_distribution(
    matrix: &MorphingMatrix,
    source: &PacketDistribution,
) -> Result<PacketDistribution> {
    check_sizes(matrix, source)?;

    let mut target = vec![0.0; matrix.size()];
    for (column, &s) in matrix.columns().zip(source.probabilities()) {
        for (row, p) in column.iter() {
            target[row] += p * s;
        }
    }
    PacketDistribution::from_probabilities(target)
}

/// Total overhead of both strategies over one simulated run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GainReport {
    pub packets: usize,
    /// Bytes of padding and split penalties when sampling directly
    pub sampling: u64,
    /// Bytes of padding and split penalties when morphing
    pub morphing: u64,
}

impl GainReport {
    /// Bytes saved by morphing; negative when sampling was cheaper
    pub fn gain(&self) -> i64 {
        self.sampling as i64 - self.morphing as i64
    }
}

/// Simulate `packets` packets and total the overhead of each strategy
pub fn simulate_gain<R: Rng + ?Sized>(
    matrix: &MorphingMatrix,
    source: &PacketDistribution,
    target: &PacketDistribution,
    packets: usize,
    split_penalty: u64,
    rng: &mut R,
) -> Result<GainReport> {
    info_span!("simulate_gain", packets, split_penalty).in_scope(|| {
        check_sizes(matrix, source)?;
        if target.len() != matrix.size() {
            return Err(DreamError::invalid_argument(
                "target",
                format!(
                    "distribution covers {} lengths but the matrix models {}",
                    target.len(),
                    matrix.size()
                ),
            ));
        }
        source.check_mass(DEFAULT_MASS_TOLERANCE)?;
        target.check_mass(DEFAULT_MASS_TOLERANCE)?;

        let mut report = GainReport {
            packets,
            sampling: 0,
            morphing: 0,
        };

        for i in 0..packets {
            let length = source.sample_length(rng);

            let first = target.sample_length(rng);
            let sampling = send_packet(length, first, target, split_penalty, rng);

            let first = sampler::sample_with_rng(matrix, length, rng)?;
            let morphing = send_packet(length, first, target, split_penalty, rng);

            trace!(packet = i, length, sampling, morphing, "simulated packet");
            report.sampling += sampling;
            report.morphing += morphing;
        }

        debug!(
            sampling = report.sampling,
            morphing = report.morphing,
            "gain simulation finished"
        );
        Ok(report)
    })
}

/// Overhead of sending `length` bytes whose first target is `first`
fn send_packet<R: Rng + ?Sized>(
    length: usize,
    first: usize,
    target: &PacketDistribution,
    split_penalty: u64,
    rng: &mut R,
) -> u64 {
    let mut remaining = length;
    let mut next = first;
    let mut overhead = 0;

    // Targets are at least 1, so every split shrinks what is left
    while next < remaining {
        overhead += split_penalty;
        remaining -= next;
        next = target.sample_length(rng);
    }
    overhead + (next - remaining) as u64
}
