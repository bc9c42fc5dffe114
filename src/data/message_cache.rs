//! Bounded cache of recently seen messages, used to report deleted content.

use lru::LruCache;
use serenity::all::MessageId;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::message::ChannelMessage;

pub const MESSAGE_CACHE_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct MessageCache {
    inner: Arc<Mutex<LruCache<MessageId, ChannelMessage>>>,
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new(MESSAGE_CACHE_CAPACITY)
    }
}

impl MessageCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    #[cfg(test)]
    pub async fn get(&self, message_id: MessageId) -> Option<ChannelMessage> {
        self.inner.lock().await.get(&message_id).cloned()
    }

    pub async fn put(&self, message: ChannelMessage) {
        self.inner.lock().await.put(message.id, message);
    }

    pub async fn remove(&self, message_id: MessageId) -> Option<ChannelMessage> {
        self.inner.lock().await.pop(&message_id)
    }

    /// Replaces the content of a cached message. Returns false on a miss.
    pub async fn update_content(&self, message_id: MessageId, content: String) -> bool {
        match self.inner.lock().await.get_mut(&message_id) {
            Some(message) => {
                message.content = content;
                true
            }
            None => false,
        }
    }
}
