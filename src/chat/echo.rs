//! Echo chat backend: answers with the user message prefixed by `[echo]`.
//! Lets the chat flow run end to end without a proxy or credentials.

use super::{ChatError, ChatRequest};

#[derive(Debug, Clone, Default)]
pub struct EchoBackend;

impl EchoBackend {
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        Ok(format!("[echo] {}", request.user_message))
    }
}
