//! Directory-backed file store.

use crate::error::{StoreError, StoreResult};
use crate::{FileKind, FileStore};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// A [`FileStore`] serving a single directory on disk.
///
/// Version-control bookkeeping (the `.git` directory) is never listed.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store over the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path against the root, rejecting escapes.
    fn resolve(&self, path: &Path) -> StoreResult<PathBuf> {
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(StoreError::OutsideRoot(path.display().to_string()));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl FileStore for DirStore {
    async fn list_files(&self, globs: Option<&[String]>) -> StoreResult<Vec<PathBuf>> {
        let all = vec!["**/*".to_string()];
        let patterns = match globs {
            Some(patterns) if !patterns.is_empty() => patterns,
            _ => all.as_slice(),
        };

        let walker = globwalk::GlobWalkerBuilder::from_patterns(&self.root, patterns)
            .build()
            .map_err(|e| StoreError::Pattern(e.to_string()))?;

        let mut files = Vec::new();
        for entry in walker.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(p) => p.to_path_buf(),
                Err(_) => continue,
            };
            if relative.components().next()
                == Some(Component::Normal(".git".as_ref()))
            {
                continue;
            }
            files.push(relative);
        }
        files.sort();
        debug!(count = files.len(), "listed files");
        Ok(files)
    }

    async fn read_file(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn stat(&self, path: &Path) -> StoreResult<FileKind> {
        let full = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(meta) if meta.is_dir() => Ok(FileKind::Directory),
            Ok(_) => Ok(FileKind::File),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileKind::Missing),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, bytes).await?;
        Ok(())
    }
}
