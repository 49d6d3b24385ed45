//! Core game state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! Each mode has its own reducer; `transition` handles what they share.

mod ai_guesser;
mod effect;
pub mod event;
pub mod heuristics;
pub mod state;
pub(crate) mod transition;
mod user_guesser;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{
    GameContext, GameMode, GameState, LoggedQuestion, Outcome, Phase, Turn, MAX_QUESTIONS,
};
pub use transition::{transition, TransitionError};
