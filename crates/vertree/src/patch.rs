//! Patch transactions against the checked-out working tree.
//!
//! Both operations mutate the tree and therefore guarantee a hard reset on
//! every exit path - success, conflict, or failure. The tree never retains
//! a candidate file, a scratch patch, or conflict markers past the call.

use crate::error::{RepoError, RepoResult};
use std::path::Path;
use tracing::{debug, warn};
use vertree_store::{FileKind, FileStore};
use vertree_vcs::Vcs;

/// Scratch file the patch text is staged through. Lives at the working-tree
/// root; `reset --hard` does not remove untracked files, so the transaction
/// deletes it explicitly.
pub(crate) const SCRATCH_PATCH_FILE: &str = ".vertree.patch";

/// Diff flags: tolerate trailing-whitespace drift, emit binary patches, and
/// record full blob ids so a later three-way apply can find its preimages.
const DIFF_FLAGS: &[&str] = &["--ignore-space-at-eol", "--binary", "--full-index"];

/// Outcome of applying a patch.
#[derive(Debug)]
pub struct AppliedPatch {
    /// The patched file content. `None` exactly when a binary conflict made
    /// the merge result meaningless, or when the patch deleted the file.
    pub content: Option<Vec<u8>>,
    /// Whether conflict markers were left in place (text) or the merge was
    /// impossible (binary).
    pub has_conflicts: bool,
}

/// How a failed apply is interpreted.
///
/// `git apply --3way` reports conflicts only through its stderr text, so
/// classification pattern-matches the message. The exact phrases, stable
/// across git releases:
/// - text conflict: `Applied patch to '<file>' with conflicts.`
/// - binary conflict: `Cannot merge binary files: <file>` (git then also
///   prints the "with conflicts" line, so binary is checked first)
#[derive(Debug, PartialEq, Eq)]
enum ApplyFailure {
    TextConflict,
    BinaryConflict,
    Other,
}

fn classify_apply_failure(stderr: &str) -> ApplyFailure {
    if stderr.contains("Cannot merge binary files") {
        ApplyFailure::BinaryConflict
    } else if stderr.contains("with conflicts") {
        ApplyFailure::TextConflict
    } else {
        ApplyFailure::Other
    }
}

/// Generate a patch that turns the stored `filename` into `new_content`.
///
/// Fails with [`RepoError::EmptyPatch`] when the new content is identical
/// to the stored file - a no-op patch indicates a caller bug upstream.
pub(crate) async fn generate(
    vcs: &dyn Vcs,
    store: &dyn FileStore,
    filename: &Path,
    new_content: &[u8],
) -> RepoResult<String> {
    let result = async {
        // git diff ignores untracked files: writing a path absent from the
        // checkout would produce an empty diff and leak an untracked file
        // past the hard reset. Reject it before touching the tree.
        if store.stat(filename).await? != FileKind::File {
            return Err(RepoError::EmptyPatch);
        }
        store.write_file(filename, new_content).await?;
        let patch = vcs.diff(DIFF_FLAGS).await?;
        if patch.trim().is_empty() {
            return Err(RepoError::EmptyPatch);
        }
        debug!(file = %filename.display(), bytes = patch.len(), "generated patch");
        Ok(patch)
    }
    .await;

    finish(vcs, None, result).await
}

/// Apply `patch_text` on top of the checked-out version, three-way.
///
/// Conflicts are a normal outcome, reported in the result rather than as an
/// error; the stored file itself is never mutated by this call.
pub(crate) async fn apply(
    vcs: &dyn Vcs,
    store: &dyn FileStore,
    workdir: &Path,
    filename: &Path,
    patch_text: &str,
) -> RepoResult<AppliedPatch> {
    let scratch = Path::new(SCRATCH_PATCH_FILE);
    let result = async {
        store.write_file(scratch, patch_text.as_bytes()).await?;

        match vcs.apply(scratch, true).await {
            Ok(()) => {
                let content = store.read_file(filename).await?;
                Ok(AppliedPatch {
                    content,
                    has_conflicts: false,
                })
            }
            Err(err) => {
                let failure = err
                    .stderr()
                    .map(classify_apply_failure)
                    .unwrap_or(ApplyFailure::Other);
                match failure {
                    ApplyFailure::TextConflict => {
                        debug!(file = %filename.display(), "patch applied with text conflicts");
                        let content = store.read_file(filename).await?;
                        Ok(AppliedPatch {
                            content,
                            has_conflicts: true,
                        })
                    }
                    ApplyFailure::BinaryConflict => {
                        debug!(file = %filename.display(), "binary merge impossible");
                        Ok(AppliedPatch {
                            content: None,
                            has_conflicts: true,
                        })
                    }
                    ApplyFailure::Other => Err(RepoError::PatchApply(err)),
                }
            }
        }
    }
    .await;

    finish(vcs, Some(&workdir.join(SCRATCH_PATCH_FILE)), result).await
}

/// Cleanup that runs on every exit path: remove the scratch patch file (if
/// any) and hard-reset the tree. A failed reset on an otherwise successful
/// operation is an error - the tree would be left dirty for the next job; a
/// failed reset after a failed operation is logged but does not mask the
/// original error.
async fn finish<T>(
    vcs: &dyn Vcs,
    scratch: Option<&Path>,
    result: RepoResult<T>,
) -> RepoResult<T> {
    if let Some(path) = scratch {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove scratch patch file");
            }
        }
    }

    match vcs.reset_hard().await {
        Ok(()) => result,
        Err(reset_err) => match result {
            Ok(_) => Err(RepoError::Vcs(reset_err)),
            Err(op_err) => {
                warn!(error = %reset_err, "hard reset failed while cleaning up a failed operation");
                Err(op_err)
            }
        },
    }
}
