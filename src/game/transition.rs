//! Pure state transition function
//!
//! Given the same state, context and event, `transition` always produces the
//! same result and performs no I/O. The runtime executes the returned effects.

use super::state::{GameContext, GameMode, GameState, Phase, Turn};
use super::{ai_guesser, user_guesser, Effect, Event};
use crate::llm::{ChatRequest, RequestKind, TransportError};
use crate::system_prompt::{opening_message, system_prompt};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: GameState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: GameState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("The AI is still thinking, wait for its reply")]
    Busy,
    #[error("The game has not been started")]
    NotStarted,
    #[error("The game is already running, restart it instead")]
    AlreadyStarted,
    #[error("Text must not be empty")]
    EmptyInput,
    #[error("All {0} questions have been asked")]
    QuestionLimitReached(u32),
    #[error("'{intent}' is not available in {mode} mode")]
    WrongMode {
        intent: &'static str,
        mode: &'static str,
    },
    #[error("Cannot {intent} while the game is in the {phase} phase")]
    InvalidIntent {
        intent: &'static str,
        phase: &'static str,
    },
}

impl TransitionError {
    pub(super) fn invalid(event: &Event, state: &GameState) -> Self {
        TransitionError::InvalidIntent {
            intent: event.name(),
            phase: state.phase.name(),
        }
    }
}

/// Pure transition function
pub fn transition(
    state: &GameState,
    context: &GameContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        Event::StartGame if state.is_started() => Err(TransitionError::AlreadyStarted),
        Event::StartGame => Ok(start(state.mode, state.generation + 1)),

        Event::Restart if !state.is_started() => Err(TransitionError::NotStarted),
        Event::Restart => Ok(start(state.mode, state.generation + 1)),

        // Late replies from before a restart are dropped
        Event::ReplyReceived { generation, .. } | Event::ReplyFailed { generation, .. }
            if generation != state.generation || !state.is_thinking() =>
        {
            Ok(TransitionResult::new(state.clone()))
        }

        Event::ReplyFailed { error, .. } => Ok(fail(state, &error)),

        _ if event.is_round_intent() => {
            if !state.is_started() {
                return Err(TransitionError::NotStarted);
            }
            if state.is_thinking() {
                return Err(TransitionError::Busy);
            }
            if matches!(state.phase, Phase::Error { .. } | Phase::Result { .. }) {
                return Err(TransitionError::invalid(&event, state));
            }
            dispatch(state, context, event)
        }

        _ => dispatch(state, context, event),
    }
}

fn dispatch(
    state: &GameState,
    context: &GameContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match state.mode {
        GameMode::AiGuesser => ai_guesser::transition(state, context, event),
        GameMode::UserGuesser => user_guesser::transition(state, context, event),
    }
}

/// Begin a new round: seed the transcript and request the opening reply
fn start(mode: GameMode, generation: u64) -> TransitionResult {
    let state = GameState::fresh(mode, generation, opening_message(mode));
    let request = build_request(&state, RequestKind::Opening, None);
    TransitionResult::new(state)
        .with_effect(Effect::PublishState)
        .with_effect(Effect::RequestReply {
            generation,
            request,
        })
}

/// Transport failure: keep the transcript, stop the round
fn fail(state: &GameState, error: &TransportError) -> TransitionResult {
    let new_state = GameState {
        phase: Phase::Error {
            message: error.message.clone(),
            kind: error.kind,
        },
        ..state.clone()
    };
    TransitionResult::new(new_state)
        .with_effect(Effect::PublishState)
        .with_effect(Effect::NotifyError {
            message: error.message.clone(),
        })
}

/// Build a transport request from the transcript.
///
/// `last_override` replaces the text of the final message on the wire only.
pub(super) fn build_request(
    state: &GameState,
    kind: RequestKind,
    last_override: Option<String>,
) -> ChatRequest {
    let mut messages = state.to_messages();
    if let (Some(text), Some(last)) = (last_override, messages.last_mut()) {
        last.content = text;
    }
    ChatRequest {
        system: system_prompt(state.mode).to_string(),
        messages,
        max_tokens: None,
        kind,
    }
}

/// Append a player turn and ask the transport for a reply
pub(super) fn send_player_turn(
    state: &GameState,
    phase: Phase,
    text: String,
    kind: RequestKind,
    wire_text: Option<String>,
) -> TransitionResult {
    let turn = Turn::human(text);
    let mut new_state = GameState {
        phase,
        ..state.clone()
    };
    new_state.transcript.push(turn.clone());
    let request = build_request(&new_state, kind, wire_text);
    let generation = new_state.generation;

    TransitionResult::new(new_state)
        .with_effect(Effect::notify_turn(&turn))
        .with_effect(Effect::PublishState)
        .with_effect(Effect::RequestReply {
            generation,
            request,
        })
}

/// Append the assistant's reply and move to `phase`
pub(super) fn record_reply(state: &GameState, phase: Phase, text: String) -> (GameState, Turn) {
    let turn = Turn::assistant(text);
    let mut new_state = GameState {
        phase,
        ..state.clone()
    };
    new_state.transcript.push(turn.clone());
    (new_state, turn)
}

/// Trimmed, non-empty player text
pub(super) fn require_text(text: &str) -> Result<String, TransitionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(TransitionError::EmptyInput)
    } else {
        Ok(trimmed.to_string())
    }
}
