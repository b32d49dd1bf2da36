//! # I/O Module
//!
//! File reading/writing boundaries. Converts between the Matrix Market
//! coordinate format on disk and the in-memory `MorphingMatrix`.

pub mod matrix_market;

pub use matrix_market::{
    open, read_morphing_matrix, write_matrix_market, MatrixMarketReader, SizeLine, Typecode,
};
