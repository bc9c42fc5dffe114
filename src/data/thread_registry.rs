//! Dedup set for one-time thread processing.

use lru::LruCache;
use serenity::all::ChannelId;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread creation events for the same thread arrive within seconds, so only
/// the most recent claims need remembering.
pub const THREAD_REGISTRY_CAPACITY: usize = 1000;

/// Threads already handled by the forum or ticket processors.
///
/// Both processors share one lock so check-then-insert happens in a single
/// critical section.
#[derive(Clone)]
pub struct ThreadRegistry {
    processed: Arc<Mutex<LruCache<ChannelId, ()>>>,
}

impl Default for ThreadRegistry {
    fn default() -> Self {
        Self::with_capacity(THREAD_REGISTRY_CAPACITY)
    }
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            processed: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Claims `thread_id` for processing. Returns false if it was already claimed.
    pub async fn claim(&self, thread_id: ChannelId) -> bool {
        let mut processed = self.processed.lock().await;
        if processed.contains(&thread_id) {
            return false;
        }
        processed.put(thread_id, ());
        true
    }

    #[cfg(test)]
    pub async fn is_processed(&self, thread_id: ChannelId) -> bool {
        self.processed.lock().await.contains(&thread_id)
    }
}
