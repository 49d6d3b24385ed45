//! 20 Questions - play the guessing game against an LLM
//!
//! Either the model asks the questions or the player does. Each game is a
//! pure state machine driven by a small runtime, served over HTTP and SSE.

mod api;
mod game;
mod llm;
mod runtime;
mod system_prompt;

use api::{create_router, AppState};
use llm::{TransportConfig, TransportProvider};
use runtime::GameLimits;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twenty_questions=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("TWENTYQ_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let transport_config = TransportConfig::from_env();
    let provider = TransportProvider::new(&transport_config)?;
    tracing::info!(
        transport = provider.label(),
        model = %transport_config.model,
        "Chat transport initialized"
    );

    let limits = GameLimits::from_env();
    tracing::info!(
        idle_timeout_secs = limits.idle_timeout.as_secs(),
        max_games = limits.max_games,
        "Game limits configured"
    );

    let state = AppState::new(provider, limits);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("20 Questions server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
