//! Chat assistant: asks an external proxy questions about one topic.
//!
//! `ChatBackend` is an enum over concrete backends. The HTTP backend talks to
//! the chat proxy; the echo backend answers locally and needs no credentials.
//!
//! Failures are classified into four codes (`network`, `auth`, `server`,
//! `unknown`) and handed back as [`ChatError`] values. Nothing is retried;
//! the caller decides whether the user may try again.

#[cfg(feature = "chat")]
pub mod client;
pub mod context;
pub mod echo;
pub mod history;
pub mod session;

pub use context::{prepare_article_context, ArticleContext};
pub use history::ChatHistory;
pub use session::{ChatReply, ChatSession};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatErrorCode {
    /// No response at all (connection refused, DNS, timeout).
    Network,
    /// HTTP 401.
    Auth,
    /// HTTP 5xx.
    Server,
    /// Any other non-2xx status or an unreadable reply.
    Unknown,
}

impl fmt::Display for ChatErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChatErrorCode::Network => "network",
            ChatErrorCode::Auth => "auth",
            ChatErrorCode::Server => "server",
            ChatErrorCode::Unknown => "unknown",
        })
    }
}

/// A classified chat failure with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} error: {message}")]
pub struct ChatError {
    pub code: ChatErrorCode,
    pub message: String,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
}

impl ChatError {
    pub fn network(detail: impl fmt::Display) -> Self {
        Self {
            code: ChatErrorCode::Network,
            message: format!("Could not reach the assistant. Check your connection and try again. ({detail})"),
            status: None,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self { code: ChatErrorCode::Unknown, message: message.into(), status: None }
    }
}

/// Error shapes the proxy may return in a non-2xx body.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Nested { error: NestedError },
    Flat { error: String },
    Message { message: String },
}

#[derive(Deserialize)]
struct NestedError {
    message: String,
}

/// Classify a non-2xx response by status, using the body for the message.
pub fn classify_status(status: u16, body: &str) -> ChatError {
    let (code, message) = match status {
        401 => (
            ChatErrorCode::Auth,
            "Authentication failed. Refresh the page or re-authenticate, then try again.".to_string(),
        ),
        s if s >= 500 => (
            ChatErrorCode::Server,
            "The assistant is temporarily unavailable. Please try again later.".to_string(),
        ),
        s => {
            let server_message = match serde_json::from_str::<ErrorBody>(body) {
                Ok(ErrorBody::Nested { error }) => Some(error.message),
                Ok(ErrorBody::Flat { error }) => Some(error),
                Ok(ErrorBody::Message { message }) => Some(message),
                Err(_) => None,
            };
            (
                ChatErrorCode::Unknown,
                server_message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("Request failed with status {s}")),
            )
        }
    };
    ChatError { code, message, status: Some(status) }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ChatMessage {
    /// A message stamped with the current time.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        }
    }
}

/// Body of the POST to the chat proxy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub system_prompt: String,
    pub article_context: ArticleContext,
    pub chat_history: Vec<ChatMessage>,
    pub user_message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

// ── Backend enum ──────────────────────────────────────────────────────────────

/// All available chat backends. Cheap to clone.
#[derive(Debug, Clone)]
pub enum ChatBackend {
    #[cfg(feature = "chat")]
    Http(client::ChatClient),
    Echo(echo::EchoBackend),
}

impl ChatBackend {
    /// One round-trip; returns the assistant's answer.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        match self {
            #[cfg(feature = "chat")]
            ChatBackend::Http(c) => c.complete(request).await,
            ChatBackend::Echo(e) => e.complete(request).await,
        }
    }
}
