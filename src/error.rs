//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.
//!
//! Every failure maps onto one of four kinds:
//! - `Corrupted`: the stream or header is malformed (short read, bad field,
//!   triple count mismatch)
//! - `NotMorphing`: a well-formed coordinate matrix that breaks morphing
//!   matrix rules (non-square, negative weight, gapped column)
//! - `Internal`: allocation failure while building the matrix
//! - `InvalidArgument`: a caller-supplied query parameter is out of range

use std::collections::TryReserveError;
use thiserror::Error;

/// Main error type for Dream operations
#[derive(Error, Debug)]
pub enum DreamError {
    /// Malformed stream, header or triple
    #[error("Corrupted input: {message}")]
    Corrupted { message: String },

    /// Structurally valid coordinate data that is not a morphing matrix
    #[error("Not a morphing matrix: {message}")]
    NotMorphing { message: String },

    /// Resource failures while building a matrix
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Query parameter out of its accepted range
    #[error("Invalid argument `{arg}`: {message}")]
    InvalidArgument { arg: &'static str, message: String },
}

/// Discriminant of [`DreamError`], for callers that only branch on the kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Corrupted,
    NotMorphing,
    Internal,
    InvalidArgument,
}

/// Type alias for Results using DreamError
pub type Result<T> = std::result::Result<T, DreamError>;

impl DreamError {
    /// Create a corrupted-input error
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Create a corrupted-input error anchored at a 1-based input line
    pub fn corrupted_at(line: usize, message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: format!("line {}: {}", line, message.into()),
        }
    }

    /// Create a not-a-morphing-matrix error
    pub fn not_morphing(message: impl Into<String>) -> Self {
        Self::NotMorphing {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            message: message.into(),
        }
    }

    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Corrupted { .. } => ErrorKind::Corrupted,
            Self::NotMorphing { .. } => ErrorKind::NotMorphing,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }
}

// The core only ever reads, so any I/O failure is a truncated or unreadable stream
impl From<std::io::Error> for DreamError {
    fn from(err: std::io::Error) -> Self {
        Self::Corrupted {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<TryReserveError> for DreamError {
    fn from(err: TryReserveError) -> Self {
        Self::Internal {
            message: format!("allocation failed: {}", err),
        }
    }
}
