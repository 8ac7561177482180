//! Error types for the core crate.

use thiserror::Error;
use vertree_store::StoreError;
use vertree_vcs::VcsError;

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced by the versioned repository.
///
/// Patch conflicts are deliberately not here: a conflicted apply is a
/// normal outcome, reported through [`crate::AppliedPatch::has_conflicts`].
#[derive(Debug, Error)]
pub enum RepoError {
    /// The version string is not a well-formed semantic version.
    #[error("invalid version {input:?}: {reason}")]
    InvalidVersion {
        /// The offending input.
        input: String,
        /// Why parsing rejected it.
        reason: String,
    },

    /// The remote commit-metadata lookup failed.
    #[error("failed to resolve commit id for {short:?}: {message}")]
    RefResolution {
        /// The abbreviated commit id that was being expanded.
        short: String,
        /// Lookup failure detail (status or transport error).
        message: String,
    },

    /// A shallow fetch failed, typically because the version does not
    /// exist upstream. Names the reference that was attempted.
    #[error("failed to fetch {reference:?}: {source}")]
    Fetch {
        /// The git reference the fetch asked for.
        reference: String,
        /// The underlying command failure.
        #[source]
        source: VcsError,
    },

    /// A generated patch was empty: the new content matches the stored
    /// file, so the request was a no-op.
    #[error("patch is empty: new content is identical to the stored file")]
    EmptyPatch,

    /// Applying a patch failed for a reason other than a recognized
    /// conflict.
    #[error("failed to apply patch: {0}")]
    PatchApply(#[source] VcsError),

    /// Version-control error outside the cases above.
    #[error("version control error: {0}")]
    Vcs(#[from] VcsError),

    /// File-store error.
    #[error("file store error: {0}")]
    Store(#[from] StoreError),

    /// The operation queue worker is gone. Only possible during shutdown.
    #[error("operation queue is closed")]
    Closed,
}
