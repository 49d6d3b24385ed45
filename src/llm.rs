//! Chat transport abstraction
//!
//! Exchanges a transcript plus system prompt for a model reply.

mod anthropic;
mod config;
mod error;
mod scripted;
mod types;

pub use anthropic::AnthropicTransport;
pub use config::{TransportConfig, TransportProvider};
pub use error::{TransportError, TransportErrorKind};
pub use scripted::ScriptedTransport;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for chat completion backends
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the conversation and return the reply text
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        (**self).send(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for chat transports
pub struct LoggingTransport {
    inner: Arc<dyn ChatTransport>,
    model_id: String,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn ChatTransport>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ChatTransport for LoggingTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    kind = request.kind.as_str(),
                    messages = request.messages.len(),
                    duration_ms = %duration.as_millis(),
                    input_tokens = reply.usage.input_tokens,
                    output_tokens = reply.usage.output_tokens,
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    kind = request.kind.as_str(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "Chat request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
