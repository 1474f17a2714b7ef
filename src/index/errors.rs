//! Index error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Failures while reading or appending the index log
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index file could not be opened, read or written
    #[error("index I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line carries a separator but an unusable field
    #[error("invalid index entry on line {line} of {}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Line number of a parse failure (1-based)
    pub fn line(&self) -> Option<usize> {
        match self {
            IndexError::Parse { line, .. } => Some(*line),
            IndexError::Io { .. } => None,
        }
    }
}
