//! # Dream: Packet-Length Morphing
//!
//! Loads a morphing matrix and samples or lists target packet lengths.
//!
//! ## Usage
//! ```bash
//! # One target length for an 85 byte packet
//! dream --matrix morphing.mtx --length 85
//!
//! # Every possible target with its probability
//! dream --matrix morphing.mtx --length 85 --list
//!
//! # Simulated overhead of morphing against direct sampling
//! dream --matrix morphing.mtx --source tor.txt --target https.txt --packets 50000
//! ```

use std::time::Instant;

use tracing::info;

use dream::model::{expected_overhead, expected_padding, print_potential, simulate_gain};
use dream::{Config, MorphingMatrix, PacketDistribution, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // A second init (e.g. under a test harness) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let start = Instant::now();

    let config = Config::parse_and_validate()?;
    setup_logging(&config.log_level);

    let matrix = MorphingMatrix::open(&config.matrix, &config.convert_options())?;
    info!(
        size = matrix.size(),
        entries = matrix.entries_n(),
        path = ?config.matrix,
        "loaded morphing matrix"
    );

    if let Some(length) = config.length {
        if config.list {
            print_potential(&matrix, length);
        } else if let Some(r) = config.rand {
            println!("{}", matrix.target_length(length, r)?);
        } else {
            let mut rng = config.rng();
            for _ in 0..config.samples {
                println!("{}", matrix.target_length_with(length, &mut rng)?);
            }
        }
    }

    if let Some(path) = &config.source {
        let source = PacketDistribution::open(path)?;
        println!(
            "Expected overhead: {:.4} bytes/packet",
            expected_overhead(&matrix, &source)?
        );
        println!(
            "Expected padding: {:.4} bytes/packet",
            expected_padding(&matrix, &source)?
        );

        if let Some(target_path) = &config.target {
            let target = PacketDistribution::open(target_path)?;
            let mut rng = config.rng();
            let report = simulate_gain(
                &matrix,
                &source,
                &target,
                config.packets,
                config.split_penalty,
                &mut rng,
            )?;

            println!(
                "Simulated {} packets: sampling {} bytes, morphing {} bytes",
                report.packets, report.sampling, report.morphing
            );
            let gain = report.gain();
            if gain >= 0 {
                println!("Morpher won ({})", gain);
            } else {
                println!("Morpher lost ({})", gain.unsigned_abs());
            }
        }
    }

    info!(elapsed_secs = start.elapsed().as_secs_f64(), "done");
    Ok(())
}
