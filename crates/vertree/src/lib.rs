//! Versioned source-tree file store with transactional patching.
//!
//! This crate exposes named, versioned snapshots of an upstream source
//! tree (identified by release version strings) as a random-access file
//! store, backed by a single shared git checkout:
//! - version strings are resolved to concrete git references, with a
//!   remote commit-metadata lookup for nightly builds
//! - a serial, version-keyed scheduler guarantees exactly one operation
//!   touches the working tree at a time
//! - checkouts take a fast local path when possible and fall back to a
//!   shallow fetch
//! - patch generation and application are transactional: the tree is
//!   hard-reset on every exit path
//!
//! Entry point: [`VersionedRepo`].

pub mod checkout;
pub mod error;
pub mod patch;
pub mod repo;
pub mod resolve;
pub mod scheduler;
pub mod version;

pub use error::{RepoError, RepoResult};
pub use patch::AppliedPatch;
pub use repo::{VersionedRepo, VersionedRepoBuilder};
pub use resolve::{GitRef, Resolver};
pub use scheduler::Scheduler;
pub use version::Version;
pub use vertree_store::FileKind;
