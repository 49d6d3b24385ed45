//! Effects produced by state transitions

use super::state::Turn;
use crate::llm::ChatRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Publish the new state to watchers
    PublishState,

    /// Send a request to the chat transport (spawns as background task)
    RequestReply {
        generation: u64,
        request: ChatRequest,
    },

    /// A turn was appended to the transcript
    NotifyTurn { turn: Turn },

    /// Informational message for the player
    Notice { message: String },

    /// A transport call failed
    NotifyError { message: String },
}

impl Effect {
    pub fn notify_turn(turn: &Turn) -> Self {
        Effect::NotifyTurn { turn: turn.clone() }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Effect::Notice {
            message: message.into(),
        }
    }
}
