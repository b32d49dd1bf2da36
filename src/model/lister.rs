//! # Diagnostic Lister
//!
//! Reports every transformation a source length may undergo, with its
//! probability, in stored order. Reporting only: an out-of-range length
//! produces a one-line notice instead of an error.
//!
//! Probabilities are printed like C's `%g`: six significant digits, trailing
//! zeros dropped, scientific notation below `1e-4`.

use std::io::{self, Write};

use crate::data::csc::MorphingMatrix;

/// `(one-based target length, probability)` pairs for one-based `source_length`
pub fn potential(matrix: &MorphingMatrix, source_length: usize) -> Option<Vec<(usize, f64)>> {
    let column = matrix.column(source_length.checked_sub(1)?)?;
    Some(column.iter().map(|(row, p)| (row + 1, p)).collect())
}

/// Write the listing for `source_length` to `out`
///
/// The only errors are those of the sink itself.
pub fn list<W: Write + ?Sized>(
    matrix: &MorphingMatrix,
    source_length: usize,
    out: &mut W,
) -> io::Result<()> {
    let Some(entries) = potential(matrix, source_length) else {
        return writeln!(out, "Wrong packet length given.");
    };

    writeln!(out, "A packet of length {} bytes can become:", source_length)?;
    for (target, p) in entries {
        writeln!(out, "\t{} bytes with probability {}", target, format_general(p))?;
    }
    Ok(())
}

/// Print the listing for `source_length` on stdout
pub fn print_potential(matrix: &MorphingMatrix, source_length: usize) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Broken pipes and closed stdout are not worth surfacing here
    let _ = list(matrix, source_length, &mut handle);
}

/// `value` with six significant digits in the shorter of fixed or scientific form
fn format_general(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string().to_lowercase();
    }

    // Rounding to the target precision first fixes the exponent
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.unsigned_abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}
