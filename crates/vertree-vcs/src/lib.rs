//! Version-control capability for vertree.
//!
//! This crate provides the narrow slice of version control the engine
//! needs: init, force checkout, shallow fetch, diff, three-way patch
//! apply, and hard reset. The [`Vcs`] trait is the seam; [`GitClient`]
//! implements it by shelling out to `git`.

pub mod error;
pub mod git;

pub use error::{VcsError, VcsResult};
pub use git::GitClient;

use async_trait::async_trait;
use std::path::Path;

/// The version-control operations the engine relies on.
///
/// Implementations operate on a single working tree fixed at construction
/// time. None of these methods are safe to call concurrently against the
/// same tree; serialization is the caller's responsibility.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether the working tree is already a repository.
    async fn is_repository(&self) -> bool;

    /// Initialize an empty repository in the working tree.
    async fn init(&self) -> VcsResult<()>;

    /// Check out a ref, discarding local modifications when `force` is set.
    ///
    /// Fails if the ref is unknown locally.
    async fn checkout(&self, reference: &str, force: bool) -> VcsResult<()>;

    /// Shallow-fetch a single ref from a remote.
    ///
    /// `refspec` is a full `<src>:<dst>` mapping; `depth` limits history
    /// (the engine always uses depth 1). Fails if the remote does not know
    /// the source ref.
    async fn fetch(&self, remote: &str, refspec: &str, depth: u32) -> VcsResult<()>;

    /// Diff the working tree against the last committed state.
    ///
    /// Returns the raw patch text; empty output means no changes.
    async fn diff(&self, flags: &[&str]) -> VcsResult<String>;

    /// Apply a patch file to the working tree.
    ///
    /// With `three_way` set, a common-ancestor-aware merge is attempted and
    /// conflict markers may be left in place; whitespace damage is tolerated
    /// either way. Failure (including a conflicted apply) is reported through
    /// the error's stderr text - git exposes no structured conflict result
    /// on this code path.
    async fn apply(&self, patch: &Path, three_way: bool) -> VcsResult<()>;

    /// Discard all uncommitted working-tree modifications.
    async fn reset_hard(&self) -> VcsResult<()>;
}
