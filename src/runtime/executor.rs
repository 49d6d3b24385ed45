//! Game runtime executor

use super::{Command, SseEvent};

use crate::game::{transition, Effect, Event, GameContext, GameState, TransitionError};
use crate::llm::{ChatRequest, ChatTransport};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Replies queued while the runtime is busy with a command
const REPLY_BUFFER: usize = 8;

/// Owns one game's state and applies events to it in arrival order
pub struct GameRuntime<T>
where
    T: ChatTransport + ?Sized + 'static,
{
    context: GameContext,
    state: GameState,
    transport: Arc<T>,
    command_rx: mpsc::Receiver<Command>,
    /// Transport replies are fed back through this channel
    reply_tx: mpsc::Sender<Event>,
    reply_rx: mpsc::Receiver<Event>,
    state_tx: watch::Sender<GameState>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl<T> GameRuntime<T>
where
    T: ChatTransport + ?Sized + 'static,
{
    pub fn new(
        context: GameContext,
        state: GameState,
        transport: Arc<T>,
        command_rx: mpsc::Receiver<Command>,
        state_tx: watch::Sender<GameState>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        let (reply_tx, reply_rx) = mpsc::channel(REPLY_BUFFER);
        Self {
            context,
            state,
            transport,
            command_rx,
            reply_tx,
            reply_rx,
            state_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(game_id = %self.context.game_id, mode = self.state.mode.as_str(), "Starting game runtime");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    // All handles dropped: the game was removed
                    let Some(Command { event, ack }) = command else {
                        break;
                    };
                    let result = self.process_event(event);
                    if let Err(e) = &result {
                        tracing::debug!(game_id = %self.context.game_id, error = %e, "Intent rejected");
                    }
                    let _ = ack.send(result);
                }
                Some(event) = self.reply_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::warn!(game_id = %self.context.game_id, error = %e, "Reply could not be applied");
                    }
                }
            }
        }

        tracing::info!(game_id = %self.context.game_id, "Game runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();
        let result = transition(&self.state, &self.context, event)?;

        let old_phase = self.state.phase.name();
        self.state = result.new_state;
        if old_phase != self.state.phase.name() {
            tracing::info!(
                game_id = %self.context.game_id,
                event = event_name,
                from = old_phase,
                to = self.state.phase.name(),
                turn_count = self.state.turn_count,
                "Phase changed"
            );
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::PublishState => {
                self.state_tx.send_replace(self.state.clone());
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: self.state.clone(),
                });
            }

            Effect::RequestReply {
                generation,
                request,
            } => self.spawn_request(generation, request),

            Effect::NotifyTurn { turn } => {
                let _ = self.broadcast_tx.send(SseEvent::Turn { turn });
            }

            Effect::Notice { message } => {
                let _ = self.broadcast_tx.send(SseEvent::Notice { message });
            }

            Effect::NotifyError { message } => {
                let _ = self.broadcast_tx.send(SseEvent::Error { message });
            }
        }
    }

    /// Run the transport call in the background and feed the outcome back
    /// tagged with the generation it was made for. Calls are never cancelled;
    /// a reply that outlives its round is dropped by the generation check.
    fn spawn_request(&self, generation: u64, request: ChatRequest) {
        let transport = Arc::clone(&self.transport);
        let reply_tx = self.reply_tx.clone();
        let game_id = self.context.game_id.clone();

        tokio::spawn(async move {
            tracing::debug!(game_id = %game_id, generation, kind = request.kind.as_str(), "Requesting reply");

            let event = match transport.send(&request).await {
                Ok(reply) => Event::ReplyReceived {
                    generation,
                    text: reply.text,
                },
                Err(error) => Event::ReplyFailed { generation, error },
            };

            if reply_tx.send(event).await.is_err() {
                tracing::debug!(game_id = %game_id, "Game closed before reply arrived");
            }
        });
    }
}
