//! Plain-file store capability for vertree.
//!
//! A [`FileStore`] exposes a directory as a small random-access file API:
//! glob-filtered listing, absent-if-missing reads, stat, and writes. The
//! default backend is [`DirStore`], which serves a directory on disk.

pub mod dir;
pub mod error;

pub use dir::DirStore;
pub use error::{StoreError, StoreResult};

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Nothing exists at the path.
    Missing,
}

/// Random-access file operations over a single root directory.
///
/// All paths are relative to the root.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List files under the root, optionally filtered by glob patterns.
    ///
    /// With no patterns, every file is returned. Paths are relative to the
    /// root and sorted.
    async fn list_files(&self, globs: Option<&[String]>) -> StoreResult<Vec<PathBuf>>;

    /// Read a file, returning `None` if it does not exist.
    async fn read_file(&self, path: &Path) -> StoreResult<Option<Vec<u8>>>;

    /// What, if anything, exists at the path.
    async fn stat(&self, path: &Path) -> StoreResult<FileKind>;

    /// Write a file, creating parent directories as needed.
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> StoreResult<()>;
}
