//! # Dream Library Root
//!
//! ## Role
//! Morphing matrices for packet-length traffic morphing. A morphing matrix
//! holds, for every source packet length, a probability distribution over
//! the lengths it may be transformed into.
//!
//! ## Usage
//! ```
//! use dream::{ConvertOptions, read_morphing_matrix};
//!
//! let text = "%%MatrixMarket matrix coordinate real general\n\
//!             2 2 3\n\
//!             1 1 0.5\n\
//!             1 2 0.5\n\
//!             2 1 1.0\n";
//! let matrix = read_morphing_matrix(text.as_bytes(), &ConvertOptions::default())?;
//! assert_eq!(matrix.col_ptrs(), &[0, 2, 3]);
//! assert_eq!(matrix.target_length(1, 0.3)?, 1);
//! # Ok::<(), dream::DreamError>(())
//! ```
//!
//! ## Module Structure
//! ```text
//! dream
//! ├── data    # Triples, the CSC morphing matrix, length distributions
//! ├── io      # Matrix Market reading/writing
//! ├── model   # Converter, sampler, lister, overhead
//! ├── config  # CLI configuration
//! └── error   # DreamError
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;

pub use config::Config;
pub use data::{MorphingMatrix, PacketDistribution, RawTriple};
pub use error::{DreamError, ErrorKind, Result};
pub use io::{read_morphing_matrix, write_matrix_market};
pub use model::{convert, convert_with, list, sample, ConvertOptions, TripleSource};
