//! Version-to-reference resolution.
//!
//! Stable releases map deterministically to their tag path; nightly builds
//! carry only an abbreviated commit id, which must be expanded to a full id
//! through the remote commit-metadata service before it can be shallow-
//! fetched (a depth-limited fetch needs the full object id).

use crate::error::{RepoError, RepoResult};
use crate::version::Version;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// A concrete git reference addressing one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitRef {
    /// Tag path for a stable release, e.g. `tags/v0.66.0`.
    Tag(String),
    /// Full commit id for a nightly build.
    Commit(String),
}

impl fmt::Display for GitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitRef::Tag(path) => write!(f, "{path}"),
            GitRef::Commit(id) => write!(f, "{id}"),
        }
    }
}

/// Response body of the commit-metadata endpoint.
#[derive(Debug, Deserialize)]
struct CommitMetadata {
    sha: String,
}

/// Resolves version strings to fetchable git references.
pub struct Resolver {
    client: reqwest::Client,
    commits_url: String,
}

impl Resolver {
    /// Create a resolver against the given commit-metadata endpoint
    /// (`GET <commits_url>/<short-id>` must return `{"sha": "<full-id>"}`).
    pub fn new(commits_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            commits_url: commits_url.into(),
        }
    }

    /// Resolve a version to a git reference.
    ///
    /// Stable versions resolve without touching the network.
    pub async fn resolve(&self, version: &Version) -> RepoResult<GitRef> {
        if !version.is_nightly() {
            return Ok(GitRef::Tag(format!("tags/v{version}")));
        }

        let short = version
            .nightly_short_hash()
            .ok_or_else(|| RepoError::RefResolution {
                short: version.pre.clone().unwrap_or_default(),
                message: "nightly version has no commit id component".to_string(),
            })?;

        let full = self.expand_short_hash(short).await?;
        Ok(GitRef::Commit(full))
    }

    /// Expand an abbreviated commit id via the metadata service.
    async fn expand_short_hash(&self, short: &str) -> RepoResult<String> {
        let url = format!("{}/{}", self.commits_url.trim_end_matches('/'), short);
        debug!(%short, %url, "expanding abbreviated commit id");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RepoError::RefResolution {
                short: short.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RepoError::RefResolution {
                short: short.to_string(),
                message: format!("metadata service returned {}", response.status()),
            });
        }

        let metadata: CommitMetadata =
            response.json().await.map_err(|e| RepoError::RefResolution {
                short: short.to_string(),
                message: format!("malformed metadata response: {e}"),
            })?;

        Ok(metadata.sha)
    }
}
