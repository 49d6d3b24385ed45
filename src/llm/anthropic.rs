//! Anthropic Messages API transport

use super::types::{ChatMessage, ChatReply, ChatRequest, Usage};
use super::{ChatTransport, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const PLACEHOLDER_KEY: &str = "your_api_key_here";
const MISSING_KEY_MESSAGE: &str =
    "Anthropic API key is not configured. Set ANTHROPIC_API_KEY or TWENTYQ_USE_MOCK=true.";

/// Anthropic transport implementation
pub struct AnthropicTransport {
    client: Client,
    api_key: Option<String>,
    model: String,
    url: String,
}

impl AnthropicTransport {
    /// Build the transport. A missing key is not an error here: every call
    /// fails with a config error instead, so the game can report it.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        gateway: Option<&str>,
    ) -> Result<Self, TransportError> {
        let base = gateway.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| TransportError::config(format!("Failed to create HTTP client: {e}")))?;

        let api_key = api_key.filter(|k| !k.trim().is_empty() && k != PLACEHOLDER_KEY);

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            url: format!("{base}/v1/messages"),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn translate_request(&self, request: &ChatRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.clone(),
            messages: request.messages.iter().map(translate_message).collect(),
        }
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> TransportError {
        let message = serde_json::from_str::<AnthropicErrorBody>(body)
            .map_or_else(|_| body.to_string(), |parsed| parsed.error.message);
        match status.as_u16() {
            401 | 403 => TransportError::auth(format!("Authentication failed: {message}")),
            429 => TransportError::rate_limit(format!("Rate limited: {message}")),
            400 => TransportError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => TransportError::server_error(format!("Server error: {message}")),
            _ => TransportError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

fn translate_message(msg: &ChatMessage) -> AnthropicMessage {
    AnthropicMessage {
        role: msg.role.as_str().to_string(),
        content: msg.content.clone(),
    }
}

fn normalize_response(resp: AnthropicResponse) -> Result<ChatReply, TransportError> {
    let text: String = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect();

    if text.trim().is_empty() {
        return Err(TransportError::malformed("Response contained no text"));
    }

    Ok(ChatReply {
        text,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    })
}

#[async_trait]
impl ChatTransport for AnthropicTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(TransportError::config(MISSING_KEY_MESSAGE));
        };
        if request.messages.is_empty() {
            return Err(TransportError::invalid_request("No messages to send"));
        }

        let body = self.translate_request(request);

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    TransportError::network(format!("Connection failed: {e}"))
                } else {
                    TransportError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::malformed(format!("Failed to parse response: {e}")))?;

        normalize_response(parsed)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}
