//! # Model Module
//!
//! ## Role
//! The algorithms that operate on morphing matrices.
//!
//! ## Sub-modules
//! - `converter`: coordinate triples to compressed-column matrix
//! - `sampler`: cumulative-distribution walk over one column
//! - `lister`: human-readable dump of one column
//! - `overhead`: expected and simulated cost of a matrix under a source distribution

pub mod converter;
pub mod lister;
pub mod overhead;
pub mod sampler;

pub use converter::{convert, convert_with, ConvertOptions, TripleSource};
pub use lister::{list, potential, print_potential};
pub use overhead::{
    expected_overhead, expected_padding, simulate_gain, target_distribution, GainReport,
};
pub use sampler::{sample, sample_with_rng};
