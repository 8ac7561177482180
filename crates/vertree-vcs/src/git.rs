//! Git subprocess client.
//!
//! Drives the `git` binary with [`tokio::process::Command`], always inside
//! the working tree the client was constructed with. Stderr of failed
//! commands is captured into [`VcsError::Command`] so callers can inspect
//! failure text (the patch-apply path depends on it).

use crate::error::{VcsError, VcsResult};
use crate::Vcs;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Git client bound to one working tree.
pub struct GitClient {
    workdir: PathBuf,
}

impl GitClient {
    /// Create a client for the given working tree.
    ///
    /// The directory must exist before commands are run.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// The working tree this client operates on.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run `git` with the given arguments, returning trimmed stdout.
    async fn run(&self, args: &[&str]) -> VcsResult<String> {
        debug!(?args, workdir = %self.workdir.display(), "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(VcsError::Command {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Vcs for GitClient {
    async fn is_repository(&self) -> bool {
        // rev-parse walks up through ancestor directories; only the workdir
        // itself counts as the repository, never an enclosing checkout.
        match self.run(&["rev-parse", "--show-toplevel"]).await {
            Ok(toplevel) => {
                let toplevel = Path::new(toplevel.trim());
                match (toplevel.canonicalize(), self.workdir.canonicalize()) {
                    (Ok(found), Ok(workdir)) => found == workdir,
                    _ => false,
                }
            }
            Err(_) => false,
        }
    }

    async fn init(&self) -> VcsResult<()> {
        self.run(&["init"]).await?;
        Ok(())
    }

    async fn checkout(&self, reference: &str, force: bool) -> VcsResult<()> {
        let mut args = vec!["checkout"];
        if force {
            args.push("--force");
        }
        args.push(reference);
        self.run(&args).await?;
        Ok(())
    }

    async fn fetch(&self, remote: &str, refspec: &str, depth: u32) -> VcsResult<()> {
        let depth = depth.to_string();
        self.run(&["fetch", "--depth", &depth, remote, refspec]).await?;
        Ok(())
    }

    async fn diff(&self, flags: &[&str]) -> VcsResult<String> {
        let mut args = vec!["diff"];
        args.extend_from_slice(flags);
        self.run(&args).await
    }

    async fn apply(&self, patch: &Path, three_way: bool) -> VcsResult<()> {
        let patch = patch.to_string_lossy();
        let mut args = vec!["apply"];
        if three_way {
            args.push("--3way");
        }
        args.push("--whitespace=nowarn");
        args.push(&patch);
        self.run(&args).await?;
        Ok(())
    }

    async fn reset_hard(&self) -> VcsResult<()> {
        self.run(&["reset", "--hard"]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn run_git(dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// A repository with one committed file and a lightweight `snap` tag.
    fn make_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        std::fs::write(dir.path().join("file.txt"), "one\ntwo\n").unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "-m", "initial"]);
        run_git(dir.path(), &["tag", "snap"]);
        dir
    }

    fn file_url(dir: &Path) -> String {
        format!("file://{}", dir.display())
    }

    #[tokio::test]
    async fn is_repository_reflects_init() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitClient::new(dir.path());
        assert!(!git.is_repository().await);
        git.init().await.unwrap();
        assert!(git.is_repository().await);
    }

    #[tokio::test]
    async fn nested_directory_inside_a_repository_is_not_one() {
        let repo = make_repo();
        let nested = repo.path().join("nested");
        std::fs::create_dir(&nested).unwrap();

        let git = GitClient::new(&nested);
        assert!(!git.is_repository().await);
        git.init().await.unwrap();
        assert!(git.is_repository().await);
    }

    #[tokio::test]
    async fn checkout_unknown_ref_fails_with_stderr() {
        let repo = make_repo();
        let git = GitClient::new(repo.path());
        let err = git.checkout("no-such-ref", true).await.unwrap_err();
        assert!(err.stderr().is_some());
        assert!(err.to_string().contains("git checkout"));
    }

    #[tokio::test]
    async fn diff_reports_working_tree_changes() {
        let repo = make_repo();
        let git = GitClient::new(repo.path());

        let clean = git.diff(&[]).await.unwrap();
        assert!(clean.trim().is_empty());

        std::fs::write(repo.path().join("file.txt"), "one\nTWO\n").unwrap();
        let dirty = git.diff(&["--ignore-space-at-eol", "--binary"]).await.unwrap();
        assert!(dirty.contains("+TWO"));
    }

    #[tokio::test]
    async fn reset_hard_restores_committed_content() {
        let repo = make_repo();
        let git = GitClient::new(repo.path());

        std::fs::write(repo.path().join("file.txt"), "scribble").unwrap();
        git.reset_hard().await.unwrap();

        let content = std::fs::read_to_string(repo.path().join("file.txt")).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[tokio::test]
    async fn shallow_fetch_maps_remote_tag_to_local_ref() {
        let upstream = make_repo();
        let dir = tempfile::tempdir().unwrap();
        let git = GitClient::new(dir.path());
        git.init().await.unwrap();

        git.fetch(
            &file_url(upstream.path()),
            "refs/tags/snap:refs/heads/snap",
            1,
        )
        .await
        .unwrap();
        git.checkout("snap", true).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("file.txt")).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[tokio::test]
    async fn fetch_unknown_ref_fails() {
        let upstream = make_repo();
        let dir = tempfile::tempdir().unwrap();
        let git = GitClient::new(dir.path());
        git.init().await.unwrap();

        let err = git
            .fetch(
                &file_url(upstream.path()),
                "refs/tags/v9.9.9:refs/heads/9.9.9",
                1,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::Command { .. }));
    }

    #[tokio::test]
    async fn apply_patches_the_working_tree() {
        let repo = make_repo();
        let git = GitClient::new(repo.path());

        std::fs::write(repo.path().join("file.txt"), "one\nTWO\n").unwrap();
        let patch = git.diff(&["--binary"]).await.unwrap();
        git.reset_hard().await.unwrap();

        std::fs::write(repo.path().join("change.patch"), patch).unwrap();
        git.apply(Path::new("change.patch"), true).await.unwrap();

        let content = std::fs::read_to_string(repo.path().join("file.txt")).unwrap();
        assert_eq!(content, "one\nTWO\n");
    }
}
