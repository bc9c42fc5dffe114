//! In-memory state of approval requests.
//!
//! Request identity lives in the approval card's button ids, so the ledger is
//! only needed to refuse a second resolution. A key the ledger does not know
//! (the process restarted, or the entry was evicted) is treated as pending.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::approval::{ApprovalKey, ApprovalState};

pub const APPROVAL_LEDGER_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct ApprovalLedger {
    inner: Arc<Mutex<LruCache<ApprovalKey, ApprovalState>>>,
}

impl Default for ApprovalLedger {
    fn default() -> Self {
        let capacity = NonZeroUsize::new(APPROVAL_LEDGER_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }
}

impl ApprovalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a freshly posted request as pending, replacing any earlier outcome.
    pub async fn open(&self, key: ApprovalKey) {
        self.inner.lock().await.put(key, ApprovalState::Pending);
    }

    #[cfg(test)]
    pub async fn state(&self, key: ApprovalKey) -> ApprovalState {
        self.inner
            .lock()
            .await
            .get(&key)
            .copied()
            .unwrap_or(ApprovalState::Pending)
    }

    /// Atomically moves a pending request into `to`.
    ///
    /// # Returns
    /// - `Ok(())` - The caller owns the transition
    /// - `Err(state)` - The request was already in terminal `state`
    pub async fn transition(
        &self,
        key: ApprovalKey,
        to: ApprovalState,
    ) -> Result<(), ApprovalState> {
        let mut ledger = self.inner.lock().await;
        let current = ledger.get(&key).copied().unwrap_or(ApprovalState::Pending);

        if current.is_terminal() {
            return Err(current);
        }
        ledger.put(key, to);
        Ok(())
    }

    /// Puts a request back to pending after its mutation failed.
    pub async fn reopen(&self, key: ApprovalKey) {
        self.inner.lock().await.put(key, ApprovalState::Pending);
    }

    /// Drops a request whose card could not be posted.
    pub async fn forget(&self, key: ApprovalKey) {
        self.inner.lock().await.pop(&key);
    }
}
