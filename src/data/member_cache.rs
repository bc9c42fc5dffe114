//! Bounded cache of last-known member state.
//!
//! The cache is the "before" side of every member-update diff. Entries are not
//! guaranteed fresh: gateway-driven updates are written back only after a delay
//! so that audit and welcome handling observe the pre-update role set.

use lru::LruCache;
use serenity::all::{RoleId, UserId};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::{approval::RoleAction, member::Member};

/// Default number of members kept before least-recently-used eviction.
pub const MEMBER_CACHE_CAPACITY: usize = 3000;

/// Member state cache shared by every handler.
///
/// Each operation takes the lock once, so get/put/remove are atomic with
/// respect to the recency bookkeeping. No operation spans multiple calls.
#[derive(Clone)]
pub struct MemberCache {
    inner: Arc<Mutex<LruCache<UserId, Member>>>,
}

impl Default for MemberCache {
    fn default() -> Self {
        Self::new(MEMBER_CACHE_CAPACITY)
    }
}

impl MemberCache {
    /// Creates an empty cache holding at most `capacity` members (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Returns a copy of the cached member and marks it most recently used.
    pub async fn get(&self, user_id: UserId) -> Option<Member> {
        self.inner.lock().await.get(&user_id).cloned()
    }

    /// Inserts or replaces the member, refreshing its recency.
    pub async fn put(&self, member: Member) {
        let user_id = member.id;
        let evicted = self.inner.lock().await.push(user_id, member);

        if let Some((evicted_id, _)) = evicted.filter(|(id, _)| *id != user_id) {
            tracing::trace!("Evicted member {} from cache", evicted_id);
        }
        tracing::debug!("Cached member {}", user_id);
    }

    pub async fn remove(&self, user_id: UserId) -> Option<Member> {
        let removed = self.inner.lock().await.pop(&user_id);
        if removed.is_some() {
            tracing::debug!("Removed member {} from cache", user_id);
        }
        removed
    }

    /// Writes `base` with `role` added or removed.
    ///
    /// Used after a successful command-driven mutation, where the acting code
    /// already holds a fresh copy of the member.
    pub async fn apply_role_change(&self, mut base: Member, action: RoleAction, role: RoleId) {
        match action {
            RoleAction::Add => base.roles.insert(role),
            RoleAction::Remove => base.roles.remove(&role),
        };
        tracing::debug!("Updated cache for member {} ({} role {})", base.id, action, role);
        self.put(base).await;
    }

    /// Number of cached members holding `role`.
    pub async fn count_with_role(&self, role: RoleId) -> usize {
        self.inner
            .lock()
            .await
            .iter()
            .filter(|(_, member)| member.has_role(role))
            .count()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
