//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CreateGameRequest, ErrorResponse, GameListResponse, GameResponse, GameSnapshot, ModeInfo,
    ModesResponse, SuccessResponse, TextRequest, VerdictRequest,
};
use super::AppState;
use crate::game::{Event, GameMode, TransitionError};
use crate::runtime::GameError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Menu
        .route("/api/modes", get(list_modes))
        // Game lifecycle
        .route("/api/games", get(list_games).post(create_game))
        .route("/api/games/:id", get(get_game).delete(delete_game))
        .route("/api/games/:id/stream", get(stream_game))
        .route("/api/games/:id/restart", post(restart_game))
        // AI Guesser intents
        .route("/api/games/:id/answer", post(answer))
        .route("/api/games/:id/verdict", post(verdict))
        // User Guesser intents
        .route("/api/games/:id/ask", post(ask))
        .route("/api/games/:id/guess", post(guess))
        .route("/api/games/:id/give-up", post(give_up))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Menu
// ============================================================

async fn list_modes(State(state): State<AppState>) -> Json<ModesResponse> {
    let modes = GameMode::ALL
        .into_iter()
        .map(|mode| ModeInfo {
            id: mode,
            title: mode.title(),
            description: mode.description(),
        })
        .collect();

    Json(ModesResponse {
        modes,
        transport: state.games.provider().label(),
    })
}

// ============================================================
// Game Lifecycle
// ============================================================

async fn list_games(State(state): State<AppState>) -> Json<GameListResponse> {
    let games = state
        .games
        .list()
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    Json(GameListResponse { games })
}

async fn create_game(
    State(state): State<AppState>,
    Json(req): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let (id, game) = state.games.create(req.mode).await?;
    Ok((
        StatusCode::CREATED,
        Json(GameResponse {
            game: GameSnapshot::new(id, &game),
        }),
    ))
}

async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    let game = state.games.snapshot(&id).await?;
    Ok(Json(GameResponse {
        game: GameSnapshot::new(id, &game),
    }))
}

async fn stream_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (game, broadcast_rx) = state.games.subscribe(&id).await?;
    let init = GameSnapshot::new(id.clone(), &game);
    Ok(sse_stream(id, init, broadcast_rx))
}

/// Back to the menu: the game and its runtime go away
async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.games.remove(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn restart_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    dispatch(&state, id, Event::Restart).await
}

// ============================================================
// Player Intents
// ============================================================

async fn answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let text = required(req.text, "Answer")?;
    dispatch(&state, id, Event::Answer { text }).await
}

async fn verdict(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VerdictRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let correct = req.correct;
    dispatch(&state, id, Event::Verdict { correct }).await
}

async fn ask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let question = required(req.text, "Question")?;
    dispatch(&state, id, Event::Ask { question }).await
}

async fn guess(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let text = required(req.text, "Guess")?;
    dispatch(&state, id, Event::Guess { text }).await
}

async fn give_up(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    dispatch(&state, id, Event::GiveUp).await
}

/// Send an intent and answer with the state right after it was applied
async fn dispatch(
    state: &AppState,
    id: String,
    event: Event,
) -> Result<Json<GameResponse>, AppError> {
    let game = state.games.send_event(&id, event).await?;
    Ok(Json(GameResponse {
        game: GameSnapshot::new(id, &game),
    }))
}

/// Reject blank input before it reaches the game
fn required(text: String, what: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("twenty_questions ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl From<GameError> for AppError {
    fn from(error: GameError) -> Self {
        match error {
            GameError::NotFound(_) => AppError::NotFound(error.to_string()),
            GameError::Rejected(TransitionError::EmptyInput) => {
                AppError::BadRequest(error.to_string())
            }
            GameError::Rejected(_) => AppError::Conflict(error.to_string()),
            GameError::AtCapacity(_) => AppError::Unavailable(error.to_string()),
            GameError::Closed => AppError::Internal(error.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
