//! Version-keyed serial operation queue.
//!
//! The working tree is a singleton resource: every operation must run with
//! the tree switched to its version, and no two operations may touch the
//! tree at once. A single worker task owns the [`CheckoutManager`] and
//! drains a channel of jobs; jobs queued for the version currently being
//! served are pulled forward and run back to back, so a burst of requests
//! for one version pays for a single checkout. Jump-ahead picks are
//! bounded, so a steady stream of one version cannot starve a waiting job
//! for another.

use crate::checkout::CheckoutManager;
use crate::error::{RepoError, RepoResult};
use crate::version::Version;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// A queued operation: the version it needs, and a closure that consumes
/// the checkout outcome and settles its caller.
struct Job {
    version: Version,
    run: Box<dyn FnOnce(RepoResult<()>) -> BoxFuture<'static, ()> + Send>,
}

/// Serializes all working-tree access through one worker task.
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Job>,
}

impl Scheduler {
    /// Start the worker task; it takes sole ownership of the checkout
    /// manager (and therefore of the working tree).
    pub fn new(checkout: CheckoutManager) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker(checkout, rx));
        Self { tx }
    }

    /// Run `action` with the working tree checked out at `version`.
    ///
    /// The action executes only after the checkout for `version` completed;
    /// a checkout failure is delivered to this caller alone and does not
    /// block later jobs. Once queued, the operation runs to completion -
    /// dropping the returned future abandons the result but not the work.
    pub async fn run<F, Fut, T>(&self, version: Version, action: F) -> RepoResult<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = RepoResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job = Job {
            version,
            run: Box::new(move |prepared: RepoResult<()>| {
                Box::pin(async move {
                    let result = match prepared {
                        Ok(()) => action().await,
                        Err(e) => Err(e),
                    };
                    let _ = done_tx.send(result);
                })
            }),
        };
        self.tx.send(job).map_err(|_| RepoError::Closed)?;
        done_rx.await.map_err(|_| RepoError::Closed)?
    }
}

/// How many times in a row a matching job may be pulled ahead of an older
/// job for another version before the oldest job runs regardless.
const MAX_JUMP_AHEAD: usize = 32;

async fn worker(mut checkout: CheckoutManager, mut rx: mpsc::UnboundedReceiver<Job>) {
    let mut backlog: VecDeque<Job> = VecDeque::new();
    let mut jumps = 0usize;

    loop {
        if backlog.is_empty() {
            match rx.recv().await {
                Some(job) => backlog.push_back(job),
                None => break,
            }
        }
        while let Ok(next) = rx.try_recv() {
            backlog.push_back(next);
        }

        // Prefer a backlog job matching the version already checked out -
        // it rides the idempotence fast path. Cross-key reordering is
        // allowed; overlap is not. Fall back to FIFO, and force it once
        // MAX_JUMP_AHEAD matching jobs have skipped an older one.
        let index = if jumps < MAX_JUMP_AHEAD {
            checkout
                .checked_out()
                .and_then(|current| backlog.iter().position(|job| &job.version == current))
                .unwrap_or(0)
        } else {
            0
        };
        let job = match backlog.remove(index) {
            Some(job) => job,
            None => continue,
        };
        jumps = if index > 0 { jumps + 1 } else { 0 };

        debug!(version = %job.version, pending = backlog.len(), "serving operation");
        let prepared = checkout.ensure_checked_out(&job.version).await;
        (job.run)(prepared).await;
    }
}
