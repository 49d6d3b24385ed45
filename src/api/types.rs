//! API request and response types

use crate::game::{GameMode, GameState, LoggedQuestion, Outcome, Phase, Turn, MAX_QUESTIONS};
use crate::runtime::GameSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to create a new game
#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub mode: GameMode,
}

/// Free-text player input (answer, question or guess)
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(alias = "question", alias = "guess")]
    pub text: String,
}

/// The player's judgement of the AI's final guess
#[derive(Debug, Deserialize)]
pub struct VerdictRequest {
    pub correct: bool,
}

/// What a client needs to render a game
#[derive(Debug, Serialize)]
pub struct GameSnapshot {
    pub id: String,
    pub mode: GameMode,
    pub phase: Phase,
    pub thinking: bool,
    pub turn_count: u32,
    pub max_questions: u32,
    pub transcript: Vec<Turn>,
    pub question_log: Vec<LoggedQuestion>,
    pub outcome: Option<Outcome>,
    pub final_answer: Option<String>,
    /// AI Guesser: the question the player is answering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
}

impl GameSnapshot {
    pub fn new(id: impl Into<String>, state: &GameState) -> Self {
        let current_question = match (state.mode, &state.phase) {
            (GameMode::AiGuesser, Phase::Playing { .. }) => {
                state.last_assistant_text().map(ToString::to_string)
            }
            _ => None,
        };

        Self {
            id: id.into(),
            mode: state.mode,
            phase: state.phase.clone(),
            thinking: state.is_thinking(),
            turn_count: state.turn_count,
            max_questions: MAX_QUESTIONS,
            transcript: state.transcript.clone(),
            question_log: state.question_log.clone(),
            outcome: state.outcome(),
            final_answer: state.final_answer().map(ToString::to_string),
            current_question,
        }
    }
}

/// Response with a single game
#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub game: GameSnapshot,
}

/// One entry of the game listing
#[derive(Debug, Serialize)]
pub struct GameListEntry {
    pub id: String,
    pub mode: GameMode,
    pub phase: &'static str,
    pub turn_count: u32,
    pub created_at: DateTime<Utc>,
}

impl From<GameSummary> for GameListEntry {
    fn from(summary: GameSummary) -> Self {
        Self {
            id: summary.id,
            mode: summary.mode,
            phase: summary.state.phase.name(),
            turn_count: summary.state.turn_count,
            created_at: summary.created_at,
        }
    }
}

/// Response with a list of games
#[derive(Debug, Serialize)]
pub struct GameListResponse {
    pub games: Vec<GameListEntry>,
}

/// Description of a game mode for the menu
#[derive(Debug, Serialize)]
pub struct ModeInfo {
    pub id: GameMode,
    pub title: &'static str,
    pub description: &'static str,
}

/// Response for mode list
#[derive(Debug, Serialize)]
pub struct ModesResponse {
    pub modes: Vec<ModeInfo>,
    /// "live" or "scripted"
    pub transport: &'static str,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
