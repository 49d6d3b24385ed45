//! Transport selection: live Anthropic API or scripted replies

use super::anthropic::DEFAULT_MODEL;
use super::{AnthropicTransport, ChatTransport, LoggingTransport, ScriptedTransport, TransportError};
use crate::game::GameMode;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MOCK_DELAY_MS: u64 = 400;

/// Configuration for chat transports
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub use_mock: bool,
    pub mock_delay: Duration,
    pub anthropic_api_key: Option<String>,
    /// Base URL override (e.g., a local gateway)
    pub gateway: Option<String>,
    pub model: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            use_mock: false,
            mock_delay: Duration::from_millis(DEFAULT_MOCK_DELAY_MS),
            anthropic_api_key: None,
            gateway: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let use_mock = lookup("TWENTYQ_USE_MOCK").is_some_and(|v| v.trim() == "true");
        let mock_delay_ms = lookup("TWENTYQ_MOCK_DELAY_MS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MOCK_DELAY_MS);

        Self {
            use_mock,
            mock_delay: Duration::from_millis(mock_delay_ms),
            anthropic_api_key: lookup("ANTHROPIC_API_KEY"),
            gateway: lookup("LLM_GATEWAY").filter(|g| !g.trim().is_empty()),
            model: lookup("TWENTYQ_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Scripted replies with no artificial latency
    #[cfg(test)]
    pub fn mock() -> Self {
        Self {
            use_mock: true,
            mock_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Hands out a transport for each new game
///
/// The live transport is shared. Scripted transports are created per game,
/// since each one carries its own reply cursor.
#[derive(Clone)]
pub enum TransportProvider {
    Live(Arc<dyn ChatTransport>),
    Scripted { delay: Duration },
}

impl TransportProvider {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        if config.use_mock {
            return Ok(Self::Scripted {
                delay: config.mock_delay,
            });
        }

        let live = AnthropicTransport::new(
            config.anthropic_api_key.clone(),
            config.model.clone(),
            config.gateway.as_deref(),
        )?;
        if !live.has_api_key() {
            tracing::warn!(
                "No Anthropic API key configured. Set ANTHROPIC_API_KEY or TWENTYQ_USE_MOCK=true."
            );
        }
        Ok(Self::Live(Arc::new(LoggingTransport::new(Arc::new(live)))))
    }

    /// Transport for one game of the given mode
    pub fn transport_for(&self, mode: GameMode) -> Arc<dyn ChatTransport> {
        match self {
            Self::Live(transport) => Arc::clone(transport),
            Self::Scripted { delay } => {
                let scripted = Arc::new(ScriptedTransport::for_mode(mode, *delay));
                Arc::new(LoggingTransport::new(scripted))
            }
        }
    }

    #[cfg(test)]
    pub fn is_scripted(&self) -> bool {
        matches!(self, Self::Scripted { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Live(_) => "live",
            Self::Scripted { .. } => "scripted",
        }
    }
}
