//! Process launch error types.

use std::io;

/// Error type for launching a pumped process.
#[derive(thiserror::Error, Debug)]
pub enum LaunchError {
    /// The argument vector was empty.
    #[error("Empty command")]
    EmptyCommand,
    /// The program was not found.
    #[error("Program not found: {0}")]
    NotFound(String),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LaunchError {
    /// Create a `LaunchError` from an I/O error, classifying common cases.
    pub(crate) fn from_io(err: io::Error, program: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}
