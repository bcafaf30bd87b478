//! HTTP client for the chat proxy (`POST {api_url}/chat`).
//!
//! One round-trip per call, no retries. The shared secret goes in the
//! `X-API-Key` header on every request. Constructed once at startup, then
//! cheaply cloned because `reqwest::Client` is an `Arc` internally.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, trace};

use super::{classify_status, ChatError, ChatRequest, ChatResponse};
use crate::config::ChatConfig;
use crate::error::AppError;

pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ChatClient {
    /// Build a client from config. Fails fast when the URL or secret is missing.
    pub fn new(config: &ChatConfig) -> Result<Self, AppError> {
        let api_url = config
            .api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::Config("CHAT_API_URL is not set; chat is unavailable".into()))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Config("CHAT_API_KEY is not set; chat is unavailable".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat", api_url.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        debug!(
            endpoint = %self.endpoint,
            topic = %request.article_context.id,
            history = request.chat_history.len(),
            "sending chat request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(request)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full chat request payload");
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "chat request failed (transport)");
                ChatError::network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status.as_u16(), &body);
            error!(%status, code = %err.code, "chat request returned HTTP error");
            return Err(err);
        }

        let parsed = response.json::<ChatResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize chat response");
            ChatError::unknown(format!("The assistant sent an unreadable reply: {e}"))
        })?;

        debug!(answer_len = parsed.answer.len(), "received chat response");
        Ok(parsed.answer)
    }
}
