//! Short-lived record of who invoked a role command.
//!
//! The guild audit log attributes command-driven role changes to the bot account
//! and arrives asynchronously. Tracking the invoker here for a few seconds lets the
//! member-update handler name the human who asked for the change.

use lru::LruCache;
use serenity::all::{RoleId, UserId};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::scheduler::deferred::DeferredTasks;

pub const ROLE_COMMAND_CACHE_CAPACITY: usize = 1000;

/// How long a tracked invoker stays valid.
pub const CORRELATION_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
struct Correlation {
    invoker: UserId,
    expires_at: Instant,
}

impl Correlation {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Correlation cache keyed by `(target, role)`.
///
/// Expiry is logical: `lookup` ignores entries past their deadline whether or
/// not the removal timer has fired yet.
#[derive(Clone)]
pub struct RoleCommandCache {
    inner: Arc<Mutex<LruCache<(UserId, RoleId), Correlation>>>,
    tasks: DeferredTasks,
    ttl: Duration,
}

impl RoleCommandCache {
    pub fn new(tasks: DeferredTasks) -> Self {
        Self::with_ttl(tasks, CORRELATION_TTL)
    }

    pub fn with_ttl(tasks: DeferredTasks, ttl: Duration) -> Self {
        let capacity =
            NonZeroUsize::new(ROLE_COMMAND_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
            tasks,
            ttl,
        }
    }

    /// Records `invoker` as the author of a pending change and schedules cleanup.
    ///
    /// Re-tracking the same key extends its lifetime; the earlier timer then finds
    /// an unexpired entry and leaves it alone.
    pub async fn track(&self, target: UserId, role: RoleId, invoker: UserId) {
        let expires_at = Instant::now() + self.ttl;
        self.inner.lock().await.put(
            (target, role),
            Correlation {
                invoker,
                expires_at,
            },
        );
        tracing::debug!(
            "Tracking role command on {} for role {} by {}",
            target,
            role,
            invoker
        );

        let inner = self.inner.clone();
        self.tasks.schedule(self.ttl, async move {
            let mut cache = inner.lock().await;
            let expired = cache
                .peek(&(target, role))
                .is_some_and(|entry| entry.is_expired(Instant::now()));
            if expired {
                cache.pop(&(target, role));
            }
        });
    }

    /// Invoker of a live correlation, or `None` if absent or expired.
    pub async fn lookup(&self, target: UserId, role: RoleId) -> Option<UserId> {
        let mut cache = self.inner.lock().await;
        let entry = *cache.get(&(target, role))?;

        if entry.is_expired(Instant::now()) {
            cache.pop(&(target, role));
            return None;
        }
        Some(entry.invoker)
    }

    pub async fn remove(&self, target: UserId, role: RoleId) {
        self.inner.lock().await.pop(&(target, role));
    }

    #[cfg(test)]
    async fn raw_len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
