//! File copy helper.

use std::path::{Path, PathBuf};

/// Errors from copying a file.
#[derive(thiserror::Error, Debug)]
pub enum CopyError {
    /// The source file does not exist.
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),
    /// I/O error while copying.
    #[error("Failed to copy {from} to {to}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Copy `from` to `to`, creating or truncating `to`.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns `CopyError::SourceNotFound` if `from` is missing, and
/// `CopyError::Io` for any other failure.
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64, CopyError> {
    match tokio::fs::copy(from, to).await {
        Ok(bytes) => {
            tracing::debug!(from = %from.display(), to = %to.display(), bytes, "Copied file");
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !from.exists() => {
            Err(CopyError::SourceNotFound(from.to_path_buf()))
        }
        Err(e) => Err(CopyError::Io {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        }),
    }
}
