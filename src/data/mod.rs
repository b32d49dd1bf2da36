//! # Data Module
//!
//! In-memory representations of morphing data.
//!
//! - `triple`: transient coordinate entries read from input
//! - `csc`: the compressed-column morphing matrix
//! - `distribution`: packet-length probability distributions

pub mod csc;
pub mod distribution;
pub mod triple;

// Re-export commonly used types
pub use csc::{Column, MorphingMatrix};
pub use distribution::PacketDistribution;
pub use triple::{CoordinateTriple, RawTriple};
