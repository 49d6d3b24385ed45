//! Game state types

use super::heuristics::AnswerType;
use crate::llm::{ChatMessage, RequestKind, TransportErrorKind};
use serde::{Deserialize, Serialize};

/// Questions allowed per game
pub const MAX_QUESTIONS: u32 = 20;

// ============================================================================
// Modes and Turns
// ============================================================================

/// Which side is guessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// The player thinks of an object, the AI asks questions
    AiGuesser,
    /// The AI thinks of an object, the player asks questions
    UserGuesser,
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::AiGuesser, GameMode::UserGuesser];

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::AiGuesser => "ai_guesser",
            GameMode::UserGuesser => "user_guesser",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GameMode::AiGuesser => "AI Guesser",
            GameMode::UserGuesser => "User Guesser",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameMode::AiGuesser => {
                "Think of an object and let the AI guess it by asking you questions"
            }
            GameMode::UserGuesser => {
                "The AI thinks of an object and you try to guess it by asking questions"
            }
        }
    }
}

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Human,
    Assistant,
}

/// One message of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        match self.speaker {
            Speaker::Human => ChatMessage::user(self.text.clone()),
            Speaker::Assistant => ChatMessage::assistant(self.text.clone()),
        }
    }
}

/// A completed User Guesser exchange, for the "previous questions" panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedQuestion {
    pub question: String,
    pub answer: AnswerType,
    /// Short form, e.g. "Is a fruit" or "Not alive"
    pub summary: String,
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
    /// The player gave up and the object was revealed
    Unknown,
}

// ============================================================================
// Phase
// ============================================================================

/// Stage of one game
///
/// `awaiting` is set while a transport call is in flight; no player intent
/// other than restart is accepted until it clears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Questions are being asked and answered
    Playing { awaiting: Option<RequestKind> },

    /// The question round is over
    FinalGuess {
        /// AI Guesser: the AI's final message, awaiting the player's verdict
        final_answer: Option<String>,
        awaiting: Option<RequestKind>,
    },

    /// Game over until restart
    Result {
        outcome: Outcome,
        final_answer: Option<String>,
    },

    /// A transport call failed - only restart is accepted
    Error {
        message: String,
        kind: TransportErrorKind,
    },
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Playing { awaiting: None }
    }
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Playing { .. } => "playing",
            Phase::FinalGuess { .. } => "final_guess",
            Phase::Result { .. } => "result",
            Phase::Error { .. } => "error",
        }
    }

    /// The in-flight request, if any
    pub fn awaiting(&self) -> Option<RequestKind> {
        match self {
            Phase::Playing { awaiting } | Phase::FinalGuess { awaiting, .. } => *awaiting,
            Phase::Result { .. } | Phase::Error { .. } => None,
        }
    }

    /// Position in the forward-only progression (playing < final guess < result)
    #[cfg(test)]
    pub fn rank(&self) -> u8 {
        match self {
            Phase::Playing { .. } => 0,
            Phase::FinalGuess { .. } => 1,
            Phase::Result { .. } | Phase::Error { .. } => 2,
        }
    }
}

// ============================================================================
// Game State
// ============================================================================

/// Full state of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub mode: GameMode,
    pub phase: Phase,
    /// Completed question/answer exchanges (AI Guesser: questions asked)
    pub turn_count: u32,
    pub transcript: Vec<Turn>,
    /// Incremented on every start/restart; replies from older generations are stale
    pub generation: u64,
    #[serde(default)]
    pub question_log: Vec<LoggedQuestion>,
}

impl GameState {
    /// A game that has not been started yet
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            phase: Phase::default(),
            turn_count: 0,
            transcript: Vec::new(),
            generation: 0,
            question_log: Vec::new(),
        }
    }

    /// Fresh state for a new round, seeded with the opening message
    pub fn fresh(mode: GameMode, generation: u64, opening: impl Into<String>) -> Self {
        Self {
            phase: Phase::Playing {
                awaiting: Some(RequestKind::Opening),
            },
            transcript: vec![Turn::human(opening)],
            generation,
            ..Self::new(mode)
        }
    }

    pub fn is_started(&self) -> bool {
        self.generation > 0
    }

    /// Whether a transport call is in flight
    pub fn is_thinking(&self) -> bool {
        self.phase.awaiting().is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match &self.phase {
            Phase::Result { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }

    /// AI Guesser: the message the AI committed to as its guess.
    /// User Guesser: the AI's confirmation or reveal.
    pub fn final_answer(&self) -> Option<&str> {
        match &self.phase {
            Phase::FinalGuess { final_answer, .. } | Phase::Result { final_answer, .. } => {
                final_answer.as_deref()
            }
            _ => None,
        }
    }

    /// Most recent assistant text (AI Guesser: the current question)
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Assistant)
            .map(|t| t.text.as_str())
    }

    pub fn last_human_text(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Human)
            .map(|t| t.text.as_str())
    }

    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.transcript.iter().map(Turn::to_message).collect()
    }
}

/// Context for a game (immutable configuration)
#[derive(Debug, Clone)]
pub struct GameContext {
    pub game_id: String,
    pub max_questions: u32,
}

impl GameContext {
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            max_questions: MAX_QUESTIONS,
        }
    }
}
