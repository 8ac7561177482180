//! The versioned file repository facade.

use crate::checkout::CheckoutManager;
use crate::error::{RepoError, RepoResult};
use crate::patch::{self, AppliedPatch};
use crate::resolve::Resolver;
use crate::scheduler::Scheduler;
use crate::version::Version;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use vertree_store::{DirStore, FileKind, FileStore, StoreError};
use vertree_vcs::{GitClient, Vcs};

/// Builder for [`VersionedRepo`].
pub struct VersionedRepoBuilder {
    remote_url: String,
    commits_url: String,
    workdir: Option<PathBuf>,
}

impl VersionedRepoBuilder {
    /// Override the working-tree directory.
    ///
    /// Defaults to a fixed subdirectory of the system temp directory,
    /// namespaced by this package's name.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Create the repository, its working-tree directory included.
    pub async fn build(self) -> RepoResult<VersionedRepo> {
        let workdir = self
            .workdir
            .unwrap_or_else(|| std::env::temp_dir().join(env!("CARGO_PKG_NAME")));
        tokio::fs::create_dir_all(&workdir)
            .await
            .map_err(|e| RepoError::Store(StoreError::Io(e)))?;
        info!(workdir = %workdir.display(), remote = %self.remote_url, "opening versioned repository");

        let vcs: Arc<dyn Vcs> = Arc::new(GitClient::new(&workdir));
        let store: Arc<dyn FileStore> = Arc::new(DirStore::new(&workdir));
        let resolver = Resolver::new(self.commits_url);
        let checkout = CheckoutManager::new(Arc::clone(&vcs), resolver, self.remote_url);
        let scheduler = Scheduler::new(checkout);

        Ok(VersionedRepo {
            scheduler,
            vcs,
            store,
            workdir,
        })
    }
}

/// Named, versioned snapshots of an upstream source tree, exposed as a
/// random-access file store with transactional patching.
///
/// All operations name the version they need; a serial scheduler switches
/// the single shared checkout to that version before the operation runs.
/// Concurrent callers are absorbed by the queue, never by the tree.
pub struct VersionedRepo {
    scheduler: Scheduler,
    vcs: Arc<dyn Vcs>,
    store: Arc<dyn FileStore>,
    workdir: PathBuf,
}

impl VersionedRepo {
    /// Start building a repository mirroring `remote_url`, with
    /// `commits_url` as the commit-metadata endpoint for nightly builds.
    pub fn builder(
        remote_url: impl Into<String>,
        commits_url: impl Into<String>,
    ) -> VersionedRepoBuilder {
        VersionedRepoBuilder {
            remote_url: remote_url.into(),
            commits_url: commits_url.into(),
            workdir: None,
        }
    }

    /// List the files of `version`, optionally filtered by glob patterns.
    pub async fn list_files(
        &self,
        globs: Option<Vec<String>>,
        version: &str,
    ) -> RepoResult<Vec<PathBuf>> {
        let version = Version::parse(version)?;
        let store = Arc::clone(&self.store);
        self.scheduler
            .run(version, move || async move {
                Ok(store.list_files(globs.as_deref()).await?)
            })
            .await
    }

    /// Read a file as of `version`. `None` if the file does not exist in
    /// that version.
    pub async fn read_file(
        &self,
        path: impl AsRef<Path>,
        version: &str,
    ) -> RepoResult<Option<Vec<u8>>> {
        let version = Version::parse(version)?;
        let store = Arc::clone(&self.store);
        let path = path.as_ref().to_path_buf();
        self.scheduler
            .run(version, move || async move {
                Ok(store.read_file(&path).await?)
            })
            .await
    }

    /// What exists at `path` in `version`.
    pub async fn stat(&self, path: impl AsRef<Path>, version: &str) -> RepoResult<FileKind> {
        let version = Version::parse(version)?;
        let store = Arc::clone(&self.store);
        let path = path.as_ref().to_path_buf();
        self.scheduler
            .run(version, move || async move { Ok(store.stat(&path).await?) })
            .await
    }

    /// Generate a patch that turns `path` as of `version` into
    /// `new_content`. The stored file is not mutated.
    pub async fn generate_patch(
        &self,
        path: impl AsRef<Path>,
        version: &str,
        new_content: Vec<u8>,
    ) -> RepoResult<String> {
        let version = Version::parse(version)?;
        let vcs = Arc::clone(&self.vcs);
        let store = Arc::clone(&self.store);
        let path = path.as_ref().to_path_buf();
        self.scheduler
            .run(version, move || async move {
                patch::generate(vcs.as_ref(), store.as_ref(), &path, &new_content).await
            })
            .await
    }

    /// Apply `patch_text` to `path` on top of `version`, three-way.
    ///
    /// Conflicts are reported in the result, not as errors; the stored
    /// file is not mutated either way.
    pub async fn apply_patch(
        &self,
        path: impl AsRef<Path>,
        version: &str,
        patch_text: impl Into<String>,
    ) -> RepoResult<AppliedPatch> {
        let version = Version::parse(version)?;
        let vcs = Arc::clone(&self.vcs);
        let store = Arc::clone(&self.store);
        let workdir = self.workdir.clone();
        let path = path.as_ref().to_path_buf();
        let patch_text = patch_text.into();
        self.scheduler
            .run(version, move || async move {
                patch::apply(vcs.as_ref(), store.as_ref(), &workdir, &path, &patch_text).await
            })
            .await
    }
}
