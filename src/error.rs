//! Error types for textcore.

use std::fmt;
use std::io;

/// Result type alias for textcore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for textcore operations.
///
/// Most editing operations never fail: undo/redo on an empty history is a
/// no-op and malformed highlighting rules degrade to "no match". Errors are
/// reserved for explicit validation and for the batch worker's file access.
#[derive(Debug)]
pub enum Error {
    /// I/O error while loading a search target.
    Io(io::Error),
    /// A regular expression failed to compile.
    InvalidPattern { pattern: String, cause: String },
    /// Point outside the buffer.
    PointOutOfBounds { line: usize, col: usize },
    /// Line number outside the buffer.
    LineOutOfBounds { line: usize, count: usize },
    /// The batch worker thread terminated abnormally.
    WorkerGone,
}

impl Error {
    pub fn invalid_pattern(pattern: &str, e: &regex_lite::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            cause: format!("{e}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidPattern { pattern, cause } => {
                write!(f, "{pattern}: invalid regular expression: {cause}")
            }
            Self::PointOutOfBounds { line, col } => {
                write!(f, "point ({line}, {col}) out of bounds")
            }
            Self::LineOutOfBounds { line, count } => {
                write!(f, "line {line} out of bounds for {count} lines")
            }
            Self::WorkerGone => write!(f, "batch worker terminated unexpectedly"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
