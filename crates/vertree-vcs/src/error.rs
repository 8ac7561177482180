//! Version-control error types.

use thiserror::Error;

/// Result type for version-control operations.
pub type VcsResult<T> = Result<T, VcsError>;

/// Errors that can occur while driving the version-control tool.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The git binary could not be spawned at all.
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// A git command ran and exited non-zero.
    #[error("{command} failed: {stderr}")]
    Command {
        /// The command line that was run, e.g. `git checkout --force v1.2.3`.
        command: String,
        /// Captured stderr, trimmed.
        stderr: String,
    },
}

impl VcsError {
    /// The stderr of a failed command, if this error carries one.
    ///
    /// Conflict detection pattern-matches on this text; see the patch
    /// transaction code for the phrases involved.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            VcsError::Command { stderr, .. } => Some(stderr),
            VcsError::Spawn(_) => None,
        }
    }
}
