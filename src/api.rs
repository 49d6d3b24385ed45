//! HTTP API for the 20 Questions game
//!
//! A JSON projection of game state plus an SSE stream per game.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::llm::TransportProvider;
use crate::runtime::{GameLimits, GameManager};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameManager>,
}

impl AppState {
    pub fn new(provider: TransportProvider, limits: GameLimits) -> Self {
        Self {
            games: GameManager::new(provider, limits),
        }
    }
}
