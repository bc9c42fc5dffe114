//! Tracked, cancellable background tasks.
//!
//! Handlers never detach work with a bare `tokio::spawn`. Delayed cache writes,
//! correlation expiry, ticket polling and embed suppression all go through
//! `DeferredTasks` so shutdown can cancel whatever has not started yet and wait
//! for whatever is mid-flight.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Queue of deferred tasks tied to the process lifetime.
///
/// Cloning is cheap; all clones share the same tracker and cancellation token.
#[derive(Clone, Default)]
pub struct DeferredTasks {
    tracker: TaskTracker,
    token: CancellationToken,
}

impl DeferredTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay` unless shutdown is signalled first.
    ///
    /// # Arguments
    /// - `delay` - How long to wait before running the task
    /// - `task` - Future to run once the delay has elapsed
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::trace!("Deferred task cancelled before it started");
                }
                _ = tokio::time::sleep(delay) => task.await,
            }
        });
    }

    /// Runs `task` immediately; the task is dropped at its next await point on shutdown.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::trace!("Background task cancelled");
                }
                _ = task => {}
            }
        });
    }

    /// Number of tasks that have not yet finished.
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels pending tasks and waits for all tracked tasks to exit.
    pub async fn shutdown(&self) {
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("Deferred tasks stopped");
    }

    /// Waits until every task scheduled so far has run to completion.
    #[cfg(test)]
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
