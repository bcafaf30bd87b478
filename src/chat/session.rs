//! [`ChatSession`]: a conversation about one topic.
//!
//! Every question takes the next sequence number. When an answer arrives
//! for a number that is no longer the latest, the user has already asked
//! something newer: the answer is reported as [`ChatReply::Stale`] and not
//! written to history.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::{prepare_article_context, ArticleContext, ChatBackend, ChatError, ChatHistory, ChatMessage, ChatRequest, Role};
use crate::catalog::{Topic, TopicId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Answer(String),
    /// Superseded by a later question; discard.
    Stale,
}

/// An issued question awaiting its answer.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub seq: u64,
    pub request: ChatRequest,
}

pub struct ChatSession {
    backend: ChatBackend,
    history: ChatHistory,
    system_prompt: String,
    topic_id: TopicId,
    context: ArticleContext,
    latest: AtomicU64,
}

impl ChatSession {
    pub fn new(backend: ChatBackend, history: ChatHistory, system_prompt: impl Into<String>, topic: &Topic) -> Self {
        Self {
            backend,
            history,
            system_prompt: system_prompt.into(),
            topic_id: topic.id.clone(),
            context: prepare_article_context(topic),
            latest: AtomicU64::new(0),
        }
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    /// Stored messages for this topic, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.history.load(&self.topic_id)
    }

    pub fn clear(&self) {
        self.history.clear(&self.topic_id);
    }

    /// Ask a question and wait for the answer.
    pub async fn ask(&self, user_message: &str) -> Result<ChatReply, ChatError> {
        let ticket = self.begin(user_message);
        let result = self.backend.complete(&ticket.request).await;
        self.finish(ticket.seq, result)
    }

    /// Record the user's message and build the request. The request carries
    /// the history as it was before this message.
    pub fn begin(&self, user_message: &str) -> Ticket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let prior = self.history.load(&self.topic_id);
        self.history.append(&self.topic_id, ChatMessage::now(Role::User, user_message));
        Ticket {
            seq,
            request: ChatRequest {
                system_prompt: self.system_prompt.clone(),
                article_context: self.context.clone(),
                chat_history: prior,
                user_message: user_message.to_string(),
            },
        }
    }

    /// Settle the outcome of ticket `seq`.
    pub fn finish(&self, seq: u64, result: Result<String, ChatError>) -> Result<ChatReply, ChatError> {
        let latest = self.latest.load(Ordering::SeqCst);
        if seq != latest {
            debug!(topic = %self.topic_id, seq, latest, "discarding stale chat response");
            return Ok(ChatReply::Stale);
        }
        let answer = result?;
        self.history.append(&self.topic_id, ChatMessage::now(Role::Assistant, answer.clone()));
        Ok(ChatReply::Answer(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_topic, Difficulty};
    use crate::chat::echo::EchoBackend;
    use crate::chat::ChatErrorCode;
    use crate::storage::Storage;

    fn session(storage: &Storage) -> ChatSession {
        let topic = test_topic("closures", "Closures", Difficulty::Intermediate, &["closure"]);
        ChatSession::new(
            ChatBackend::Echo(EchoBackend),
            ChatHistory::new(storage.clone(), 50),
            "tutor",
            &topic,
        )
    }

    #[tokio::test]
    async fn ask_records_both_sides() {
        let storage = Storage::in_memory();
        let s = session(&storage);
        assert_eq!(s.ask("hi").await.unwrap(), ChatReply::Answer("[echo] hi".into()));
        let messages = s.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, "[echo] hi");
    }

    #[test]
    fn request_carries_prior_history_only() {
        let storage = Storage::in_memory();
        let s = session(&storage);
        let first = s.begin("one");
        assert!(first.request.chat_history.is_empty());
        s.finish(first.seq, Ok("answer one".into())).unwrap();

        let second = s.begin("two");
        let contents: Vec<_> = second.request.chat_history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "answer one"]);
        assert_eq!(second.request.user_message, "two");
        assert_eq!(second.request.system_prompt, "tutor");
        assert_eq!(second.request.article_context.id, "closures");
    }

    #[test]
    fn superseded_answer_is_stale() {
        let storage = Storage::in_memory();
        let s = session(&storage);
        let first = s.begin("first");
        let second = s.begin("second");

        assert_eq!(s.finish(first.seq, Ok("late".into())).unwrap(), ChatReply::Stale);
        assert_eq!(s.finish(second.seq, Ok("fresh".into())).unwrap(), ChatReply::Answer("fresh".into()));

        let contents: Vec<_> = s.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, ["first", "second", "fresh"]);
    }

    #[test]
    fn latest_error_is_returned_stale_error_dropped() {
        let storage = Storage::in_memory();
        let s = session(&storage);
        let old = s.begin("a");
        let new = s.begin("b");
        assert_eq!(s.finish(old.seq, Err(ChatError::network("down"))).unwrap(), ChatReply::Stale);
        let err = s.finish(new.seq, Err(ChatError::network("down"))).unwrap_err();
        assert_eq!(err.code, ChatErrorCode::Network);
        assert_eq!(s.messages().len(), 2);
    }

    #[test]
    fn clear_removes_history() {
        let storage = Storage::in_memory();
        let s = session(&storage);
        let t = s.begin("x");
        s.finish(t.seq, Ok("y".into())).unwrap();
        s.clear();
        assert!(s.messages().is_empty());
    }
}
