//! Events that can occur in a game

use crate::llm::TransportError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Player intents
    StartGame,
    Restart,
    /// AI Guesser: answer the AI's current question
    Answer { text: String },
    /// AI Guesser: judge the AI's final guess
    Verdict { correct: bool },
    /// User Guesser: ask a yes/no question
    Ask { question: String },
    /// User Guesser: make a final guess
    Guess { text: String },
    /// User Guesser: ask the AI to reveal its object
    GiveUp,

    // Transport events, tagged with the generation they were requested under
    ReplyReceived { generation: u64, text: String },
    ReplyFailed {
        generation: u64,
        error: TransportError,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartGame => "start_game",
            Event::Restart => "restart",
            Event::Answer { .. } => "answer",
            Event::Verdict { .. } => "verdict",
            Event::Ask { .. } => "ask",
            Event::Guess { .. } => "guess",
            Event::GiveUp => "give_up",
            Event::ReplyReceived { .. } => "reply_received",
            Event::ReplyFailed { .. } => "reply_failed",
        }
    }

    /// Intents that move a round forward (everything but start/restart and replies)
    pub fn is_round_intent(&self) -> bool {
        matches!(
            self,
            Event::Answer { .. }
                | Event::Verdict { .. }
                | Event::Ask { .. }
                | Event::Guess { .. }
                | Event::GiveUp
        )
    }
}
