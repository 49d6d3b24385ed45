//! Server-Sent Events support

use super::types::GameSnapshot;
use crate::runtime::SseEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
///
/// The first event is always `init` with the full snapshot, so a client
/// that reconnects never has to replay history.
pub fn sse_stream(
    game_id: String,
    init: GameSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init_event = json!({ "type": "init", "game": init });
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(init_event.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(&game_id, event))),
        Err(_) => None, // Skip lagged messages
    });

    let keep_alive = KeepAlive::new()
        .interval(Duration::from_secs(15))
        .text("ping");
    Sse::new(init.chain(broadcasts)).keep_alive(keep_alive)
}

fn sse_event_to_axum(game_id: &str, event: SseEvent) -> Event {
    let (event_type, data) = match event {
        SseEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "game": GameSnapshot::new(game_id, &state)
            }),
        ),
        SseEvent::Turn { turn } => (
            "turn",
            json!({
                "type": "turn",
                "turn": turn
            }),
        ),
        SseEvent::Notice { message } => (
            "notice",
            json!({
                "type": "notice",
                "message": message
            }),
        ),
        SseEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
