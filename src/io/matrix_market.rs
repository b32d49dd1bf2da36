//! # Matrix Market Coordinate Files
//!
//! ## Role
//! Reading and writing morphing matrices in the Matrix Market exchange format.
//! This is the header collaborator of the converter: it classifies the banner,
//! reads the size line and hands out one literal triple at a time.
//!
//! ## Format
//! ```text
//! %%MatrixMarket matrix coordinate real general
//! %Morphing Matrix
//! 2 2 3
//! 1 1 0.5
//! 1 2 0.5
//! 2 1 1.0
//! ```
//! - Banner tokens are case-insensitive.
//! - `%` lines and blank lines may appear between banner and size line.
//! - Body lines are one-based `row col value`.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{debug, info_span};

use crate::data::csc::MorphingMatrix;
use crate::data::triple::RawTriple;
use crate::error::{DreamError, Result};
use crate::model::converter::{convert_with, ConvertOptions, TripleSource};

/// Banner prefix every Matrix Market file starts with
pub const BANNER: &str = "%%MatrixMarket";

// ============================================================================
// Typecode
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Object {
    Matrix,
    Vector,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Sparse, one line per nonzero entry
    Coordinate,
    /// Dense, column-major listing of every entry
    Array,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Real,
    Double,
    Integer,
    Complex,
    Pattern,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
    Hermitian,
}

/// Classification carried by the banner line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Typecode {
    pub object: Object,
    pub format: Format,
    pub field: Field,
    pub symmetry: Symmetry,
}

impl Typecode {
    /// Typecode written for morphing matrices
    pub const MORPHING: Typecode = Typecode {
        object: Object::Matrix,
        format: Format::Coordinate,
        field: Field::Real,
        symmetry: Symmetry::General,
    };

    /// Parse a banner line such as `%%MatrixMarket matrix coordinate real general`
    pub fn parse_banner(line: &str) -> Result<Self> {
        let tokens: Vec<String> = line
            .split_whitespace()
            .map(|t| t.to_ascii_lowercase())
            .collect();

        if tokens.len() != 5 || tokens[0] != BANNER.to_ascii_lowercase() {
            return Err(DreamError::corrupted_at(1, "missing Matrix Market banner"));
        }

        let object = match tokens[1].as_str() {
            "matrix" => Object::Matrix,
            "vector" => Object::Vector,
            other => {
                return Err(DreamError::corrupted_at(1, format!("unknown object `{}`", other)))
            }
        };
        let format = match tokens[2].as_str() {
            "coordinate" => Format::Coordinate,
            "array" => Format::Array,
            other => {
                return Err(DreamError::corrupted_at(1, format!("unknown format `{}`", other)))
            }
        };
        let field = match tokens[3].as_str() {
            "real" => Field::Real,
            "double" => Field::Double,
            "integer" => Field::Integer,
            "complex" => Field::Complex,
            "pattern" => Field::Pattern,
            other => {
                return Err(DreamError::corrupted_at(1, format!("unknown field `{}`", other)))
            }
        };
        let symmetry = match tokens[4].as_str() {
            "general" => Symmetry::General,
            "symmetric" => Symmetry::Symmetric,
            "skew-symmetric" => Symmetry::SkewSymmetric,
            "hermitian" => Symmetry::Hermitian,
            other => {
                return Err(DreamError::corrupted_at(
                    1,
                    format!("unknown symmetry `{}`", other),
                ))
            }
        };

        Ok(Self {
            object,
            format,
            field,
            symmetry,
        })
    }

    /// False for combinations the format itself forbids
    pub fn is_valid(&self) -> bool {
        if self.object != Object::Matrix {
            return false;
        }
        if self.format == Format::Array && self.field == Field::Pattern {
            return false;
        }
        if self.symmetry == Symmetry::Hermitian
            && matches!(self.field, Field::Real | Field::Double | Field::Integer | Field::Pattern)
        {
            return false;
        }
        if self.symmetry == Symmetry::SkewSymmetric && self.field == Field::Pattern {
            return false;
        }
        true
    }

    pub fn is_matrix(&self) -> bool {
        self.object == Object::Matrix
    }

    pub fn is_sparse(&self) -> bool {
        self.format == Format::Coordinate
    }

    pub fn is_real(&self) -> bool {
        matches!(self.field, Field::Real | Field::Double)
    }

    /// True when the banner describes something a morphing matrix can be read from
    pub fn is_morphing_candidate(&self) -> bool {
        self.is_valid() && self.is_matrix() && self.is_sparse() && self.is_real()
    }
}

impl fmt::Display for Typecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let object = match self.object {
            Object::Matrix => "matrix",
            Object::Vector => "vector",
        };
        let format = match self.format {
            Format::Coordinate => "coordinate",
            Format::Array => "array",
        };
        let field = match self.field {
            Field::Real => "real",
            Field::Double => "double",
            Field::Integer => "integer",
            Field::Complex => "complex",
            Field::Pattern => "pattern",
        };
        let symmetry = match self.symmetry {
            Symmetry::General => "general",
            Symmetry::Symmetric => "symmetric",
            Symmetry::SkewSymmetric => "skew-symmetric",
            Symmetry::Hermitian => "hermitian",
        };
        write!(f, "{} {} {} {} {}", BANNER, object, format, field, symmetry)
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Declared dimensions from the size line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeLine {
    pub rows_n: i64,
    pub cols_n: i64,
    pub nz_entries: i64,
}

/// Line-oriented Matrix Market reader
///
/// Call `read_banner`, then `read_size`, then pull triples through
/// [`TripleSource`].
pub struct MatrixMarketReader<R: BufRead> {
    reader: R,
    line: String,
    line_num: usize,
}

impl<R: BufRead> MatrixMarketReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_num: 0,
        }
    }

    /// 1-based number of the last line read
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    /// Read the next line into the buffer; false at EOF
    fn next_line(&mut self) -> Result<bool> {
        self.line.clear();
        let bytes_read = self.reader.read_line(&mut self.line)?;
        if bytes_read == 0 {
            return Ok(false);
        }
        self.line_num += 1;
        Ok(true)
    }

    pub fn read_banner(&mut self) -> Result<Typecode> {
        if !self.next_line()? {
            return Err(DreamError::corrupted("empty input"));
        }
        Typecode::parse_banner(&self.line)
    }

    /// Skip comments and blank lines, then parse `rows cols nz`
    pub fn read_size(&mut self) -> Result<SizeLine> {
        loop {
            if !self.next_line()? {
                return Err(DreamError::corrupted("missing size line"));
            }
            let line = self.line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(DreamError::corrupted_at(
                    self.line_num,
                    format!("size line needs 3 fields, got {}", parts.len()),
                ));
            }
            let mut dims = [0i64; 3];
            for (dim, part) in dims.iter_mut().zip(&parts) {
                *dim = part.parse().map_err(|_| {
                    DreamError::corrupted_at(
                        self.line_num,
                        format!("Invalid size field `{}`", part),
                    )
                })?;
            }

            return Ok(SizeLine {
                rows_n: dims[0],
                cols_n: dims[1],
                nz_entries: dims[2],
            });
        }
    }
}

impl<R: BufRead> TripleSource for MatrixMarketReader<R> {
    fn next_triple(&mut self) -> Result<RawTriple> {
        loop {
            if !self.next_line()? {
                return Err(DreamError::corrupted(format!(
                    "input ended after line {} while entries were still expected",
                    self.line_num
                )));
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 3 {
                return Err(DreamError::corrupted_at(
                    self.line_num,
                    format!("expected `row col value`, got {} fields", parts.len()),
                ));
            }
            let row: i64 = parts[0]
                .parse()
                .map_err(|_| DreamError::corrupted_at(self.line_num, "Invalid row"))?;
            let col: i64 = parts[1]
                .parse()
                .map_err(|_| DreamError::corrupted_at(self.line_num, "Invalid column"))?;
            let value: f64 = parts[2]
                .parse()
                .map_err(|_| DreamError::corrupted_at(self.line_num, "Invalid value"))?;

            return Ok(RawTriple::new(row, col, value));
        }
    }

    fn finish(&mut self) -> Result<()> {
        while self.next_line()? {
            let line = self.line.trim();
            if !(line.is_empty() || line.starts_with('%')) {
                return Err(DreamError::corrupted_at(
                    self.line_num,
                    "more entries than declared in the size line",
                ));
            }
        }
        Ok(())
    }
}

/// Parse a complete Matrix Market stream into a morphing matrix
pub fn read_morphing_matrix<R: BufRead>(
    reader: R,
    options: &ConvertOptions,
) -> Result<MorphingMatrix> {
    info_span!("read_morphing_matrix").in_scope(|| {
        let mut mm = MatrixMarketReader::new(reader);

        let typecode = mm.read_banner()?;
        if !typecode.is_morphing_candidate() {
            return Err(DreamError::not_morphing(format!(
                "banner `{}` is not a valid sparse real matrix",
                typecode
            )));
        }

        let size = mm.read_size()?;
        debug!(
            rows = size.rows_n,
            cols = size.cols_n,
            nz = size.nz_entries,
            "read size line"
        );

        convert_with(&mut mm, size.rows_n, size.cols_n, size.nz_entries, options)
    })
}

/// Open and parse a Matrix Market file
pub fn open(path: &Path, options: &ConvertOptions) -> Result<MorphingMatrix> {
    info_span!("matrix_market_open", path = ?path).in_scope(|| {
        let file = File::open(path)?;
        read_morphing_matrix(BufReader::new(file), options)
    })
}

/// Write `matrix` as a Matrix Market coordinate file
///
/// Entries are written column by column in stored order, so reading the
/// output back yields identical arrays.
pub fn write_matrix_market<W: Write>(
    matrix: &MorphingMatrix,
    writer: &mut W,
) -> std::io::Result<()> {
    writeln!(writer, "{}", Typecode::MORPHING)?;
    writeln!(writer, "%Morphing Matrix")?;
    writeln!(writer, "{} {} {}", matrix.size(), matrix.size(), matrix.entries_n())?;

    for (c, column) in matrix.columns().enumerate() {
        for (row, value) in column.iter() {
            writeln!(writer, "{} {} {:?}", row + 1, c + 1, value)?;
        }
    }
    writer.flush()
}
