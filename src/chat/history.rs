//! Per-topic chat history in [`Storage`], capped FIFO.
//!
//! Key: `chat-history-{topicId}`, value: JSON array of [`ChatMessage`].
//! Storage failures degrade to an empty history and are logged.

use tracing::warn;

use super::ChatMessage;
use crate::storage::{Storage, CHAT_HISTORY_PREFIX};

#[derive(Clone)]
pub struct ChatHistory {
    storage: Storage,
    cap: usize,
}

impl ChatHistory {
    pub fn new(storage: Storage, cap: usize) -> Self {
        Self { storage, cap: cap.max(1) }
    }

    pub fn key(topic_id: &str) -> String {
        format!("{CHAT_HISTORY_PREFIX}{topic_id}")
    }

    pub fn load(&self, topic_id: &str) -> Vec<ChatMessage> {
        match self.storage.get_json::<Vec<ChatMessage>>(&Self::key(topic_id)) {
            Ok(messages) => messages.unwrap_or_default(),
            Err(e) => {
                warn!(topic = %topic_id, error = %e, "cannot read chat history; starting empty");
                Vec::new()
            }
        }
    }

    pub fn append(&self, topic_id: &str, message: ChatMessage) {
        let mut messages = self.load(topic_id);
        messages.push(message);
        let overflow = messages.len().saturating_sub(self.cap);
        messages.drain(..overflow);
        if let Err(e) = self.storage.set_json(&Self::key(topic_id), &messages) {
            warn!(topic = %topic_id, error = %e, "cannot save chat history");
        }
    }

    pub fn clear(&self, topic_id: &str) {
        if let Err(e) = self.storage.remove(&Self::key(topic_id)) {
            warn!(topic = %topic_id, error = %e, "cannot clear chat history");
        }
    }
}
