//! Working-tree checkout management.

use crate::error::{RepoError, RepoResult};
use crate::resolve::Resolver;
use crate::version::Version;
use std::sync::Arc;
use tracing::{debug, info};
use vertree_vcs::Vcs;

/// Brings the shared working tree to a requested version.
///
/// Owns the `checked_out` bookkeeping and must only ever be driven from the
/// scheduler's worker task; nothing here is safe to run concurrently with
/// another tree operation.
pub struct CheckoutManager {
    vcs: Arc<dyn Vcs>,
    resolver: Resolver,
    remote_url: String,
    checked_out: Option<Version>,
}

impl CheckoutManager {
    /// Create a manager over a (possibly not yet initialized) working tree.
    pub fn new(vcs: Arc<dyn Vcs>, resolver: Resolver, remote_url: impl Into<String>) -> Self {
        Self {
            vcs,
            resolver,
            remote_url: remote_url.into(),
            checked_out: None,
        }
    }

    /// The version currently checked out, if any.
    pub fn checked_out(&self) -> Option<&Version> {
        self.checked_out.as_ref()
    }

    /// Ensure the working tree reflects exactly `version`.
    ///
    /// No-op when the version is already checked out. Otherwise tries a
    /// force checkout of the local ref named after the version (fast,
    /// offline path for previously visited versions) and falls back to
    /// resolving the version and shallow-fetching it from the remote.
    pub async fn ensure_checked_out(&mut self, version: &Version) -> RepoResult<()> {
        if self.checked_out.as_ref() == Some(version) {
            return Ok(());
        }

        if !self.vcs.is_repository().await {
            info!("initializing working-tree repository");
            self.vcs.init().await?;
        }

        let local = version.to_string();
        if self.vcs.checkout(&local, true).await.is_ok() {
            debug!(%version, "checked out from local ref");
            self.checked_out = Some(version.clone());
            return Ok(());
        }

        let reference = self.resolver.resolve(version).await?;
        debug!(%version, %reference, "no local ref, shallow-fetching");

        // The destination is qualified so git never guesses the namespace;
        // the local branch is still named exactly after the version.
        let refspec = format!("{reference}:refs/heads/{local}");
        self.vcs
            .fetch(&self.remote_url, &refspec, 1)
            .await
            .map_err(|source| RepoError::Fetch {
                reference: reference.to_string(),
                source,
            })?;
        self.vcs.checkout(&local, true).await?;

        info!(%version, "fetched and checked out");
        self.checked_out = Some(version.clone());
        Ok(())
    }
}
