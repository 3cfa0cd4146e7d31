//! Reader error types.

use std::io;

/// Errors produced by a stream reader.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    /// Block mode was configured with a size of zero.
    #[error("Block size must be positive")]
    InvalidBlockSize,

    /// A read from the source failed.
    #[error("Read failed ({kind}): {message}")]
    Io {
        /// Kind of the underlying I/O error.
        kind: io::ErrorKind,
        /// Rendered message of the underlying I/O error.
        message: String,
    },

    /// The background task panicked or was aborted.
    #[error("Reader task failed: {0}")]
    TaskFailed(String),
}

impl ReaderError {
    /// Kind of the underlying I/O error, if this is a read fault.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<io::Error> for ReaderError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for ReaderError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}
