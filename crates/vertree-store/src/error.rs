//! File-store error types.

use thiserror::Error;

/// Result type for file-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during file-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern: {0}")]
    Pattern(String),

    /// A path escapes the store root.
    #[error("path is outside the store root: {0}")]
    OutsideRoot(String),
}
