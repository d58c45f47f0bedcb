//! Error type shared across the predictext crates.
//!
//! One enum covers every failure class of the engine. Decode errors are
//! fatal to the operation that hit them; per-document training errors are
//! handled (logged and skipped) by the pipeline, not here.

use std::fmt;
use std::io;

/// Error type for dictionary, trie and prediction operations.
#[derive(Debug)]
pub enum PredictError {
    /// Malformed token/word/n-gram data: unknown type byte, truncated record.
    Decode(String),
    /// An n-gram file was opened against a word dictionary whose ids do not match.
    DictionaryMismatch(String),
    /// A mutating method was invoked on a read-only dictionary.
    UnsupportedMutation(&'static str),
    /// Underlying storage failure.
    Io(io::Error),
    /// Blank prefix, non-positive result count, zero n-gram order.
    InvalidArgument(String),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::Decode(s) => write!(f, "decode error: {}", s),
            PredictError::DictionaryMismatch(s) => write!(f, "dictionary mismatch: {}", s),
            PredictError::UnsupportedMutation(s) => {
                write!(f, "unsupported mutation on static dictionary: {}", s)
            }
            PredictError::Io(e) => write!(f, "io error: {}", e),
            PredictError::InvalidArgument(s) => write!(f, "invalid argument: {}", s),
        }
    }
}

impl std::error::Error for PredictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PredictError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PredictError {
    fn from(e: io::Error) -> Self {
        PredictError::Io(e)
    }
}

/// Alias for `std::result::Result<T, PredictError>`.
pub type Result<T> = std::result::Result<T, PredictError>;
