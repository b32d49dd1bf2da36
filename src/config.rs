//! # Configuration Logic
//!
//! ## Role
//! CLI argument parsing and validation for the `dream` binary.
//!
//! ## Fields
//! - `matrix: PathBuf` - Matrix Market morphing matrix
//! - `length: Option<usize>` - One-based source packet length to query
//! - `rand: Option<f64>` - Explicit random draw in `[0, 1]`
//! - `samples: usize` - Number of target lengths to draw (default: 1)
//! - `seed: Option<u64>` - Random seed for reproducibility
//! - `list: bool` - Print the column listing instead of sampling
//! - `source: Option<PathBuf>` - Source distribution for overhead reporting
//! - `target: Option<PathBuf>` - Target distribution for the gain simulation
//! - `packets: usize` - Packets to simulate (default: 10000)
//! - `split_penalty: u64` - Bytes charged per split packet (default: 50)
//! - `strict: bool` - Require every column to sum to 1
//!
//! ## Example CLI
//! ```bash
//! dream --matrix morphing.mtx --length 85 --rand 0.3
//! dream --matrix morphing.mtx --length 85 --list
//! dream --matrix morphing.mtx --source https_cs_distr.txt
//! dream --matrix morphing.mtx --source tor_cs_distr.txt --target https_cs_distr.txt --seed 1
//! ```

use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{DreamError, Result};
use crate::model::converter::ConvertOptions;
use crate::model::overhead::DEFAULT_SPLIT_PENALTY;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dream",
    version,
    about = "Sample and inspect packet-length morphing matrices"
)]
pub struct Config {
    /// Morphing matrix in Matrix Market coordinate format
    #[arg(long)]
    pub matrix: PathBuf,

    /// One-based source packet length
    #[arg(long)]
    pub length: Option<usize>,

    /// Random draw in [0, 1] (default: drawn from the RNG)
    #[arg(long)]
    pub rand: Option<f64>,

    /// Number of target lengths to draw
    #[arg(long, default_value_t = 1)]
    pub samples: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// List every possible target length with its probability
    #[arg(long)]
    pub list: bool,

    /// Source packet-length distribution; reports expected overhead
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Target packet-length distribution; simulates morphing against sampling
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Packets to simulate with --target
    #[arg(long, default_value_t = 10_000)]
    pub packets: usize,

    /// Bytes charged each time a simulated packet is split
    #[arg(long, default_value_t = DEFAULT_SPLIT_PENALTY)]
    pub split_penalty: u64,

    /// Reject matrices whose columns do not sum to 1
    #[arg(long)]
    pub strict: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Config {
    /// Parse from the process arguments and validate
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.matrix.is_file() {
            return Err(DreamError::invalid_argument(
                "matrix",
                format!("{} is not a file", self.matrix.display()),
            ));
        }
        if let Some(source) = &self.source {
            if !source.is_file() {
                return Err(DreamError::invalid_argument(
                    "source",
                    format!("{} is not a file", source.display()),
                ));
            }
        }
        if let Some(target) = &self.target {
            if self.source.is_none() {
                return Err(DreamError::invalid_argument("target", "--target needs --source"));
            }
            if !target.is_file() {
                return Err(DreamError::invalid_argument(
                    "target",
                    format!("{} is not a file", target.display()),
                ));
            }
            if self.packets == 0 {
                return Err(DreamError::invalid_argument("packets", "must be at least 1"));
            }
        }
        if self.length.is_none() && self.source.is_none() {
            return Err(DreamError::invalid_argument(
                "length",
                "give --length to sample or list, or --source to report overhead",
            ));
        }
        if self.list && self.length.is_none() {
            return Err(DreamError::invalid_argument("list", "--list needs --length"));
        }
        if let Some(r) = self.rand {
            if !(0.0..=1.0).contains(&r) {
                return Err(DreamError::invalid_argument(
                    "rand",
                    format!("{} is outside [0, 1]", r),
                ));
            }
            if self.samples > 1 {
                return Err(DreamError::invalid_argument(
                    "samples",
                    "a fixed --rand always yields the same length",
                ));
            }
        }
        if self.samples == 0 {
            return Err(DreamError::invalid_argument("samples", "must be at least 1"));
        }
        Ok(())
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            strict_mass: self.strict,
            ..ConvertOptions::default()
        }
    }

    /// RNG for draws: seeded when `--seed` is given, OS entropy otherwise
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
