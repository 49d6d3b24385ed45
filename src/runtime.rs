//! Runtime for running games
//!
//! Each game is owned by one task. HTTP handlers reach it through a
//! [`GameHandle`]: commands go in over mpsc and are acknowledged once the
//! transition has been applied; state comes back over watch and broadcast.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::GameRuntime;

use crate::game::{Event, GameContext, GameMode, GameState, TransitionError, Turn};
use crate::llm::{ChatTransport, TransportProvider};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};

/// Type alias for production runtime
pub type ProductionRuntime = GameRuntime<dyn ChatTransport>;

const COMMAND_BUFFER: usize = 32;
const BROADCAST_BUFFER: usize = 128;

/// Idle timeout before a game is dropped (30 minutes)
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Games allowed to run at once
const DEFAULT_MAX_GAMES: usize = 1000;

/// Idle check interval (60 seconds)
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// A player intent plus the channel its outcome is reported on
#[derive(Debug)]
pub struct Command {
    pub event: Event,
    pub ack: oneshot::Sender<Result<(), TransitionError>>,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    StateChange { state: GameState },
    Turn { turn: Turn },
    Notice { message: String },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Game not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Too many games in progress (limit {0}), try again later")]
    AtCapacity(usize),
    #[error("Game runtime stopped")]
    Closed,
}

/// How many games may run and how long an untouched one is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLimits {
    pub idle_timeout: Duration,
    pub max_games: usize,
}

impl Default for GameLimits {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_games: DEFAULT_MAX_GAMES,
        }
    }
}

impl GameLimits {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let idle_minutes = lookup("TWENTYQ_IDLE_MINUTES").and_then(|v| v.trim().parse().ok());
        let max_games = lookup("TWENTYQ_MAX_GAMES").and_then(|v| v.trim().parse().ok());

        Self {
            idle_timeout: idle_minutes.map_or(defaults.idle_timeout, minutes),
            max_games: max_games.unwrap_or(defaults.max_games),
        }
    }
}

fn minutes(count: u64) -> Duration {
    Duration::from_secs(count * 60)
}

/// Handle to interact with a running game
#[derive(Clone)]
pub struct GameHandle {
    pub mode: GameMode,
    pub created_at: DateTime<Utc>,
    pub command_tx: mpsc::Sender<Command>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    pub state_rx: watch::Receiver<GameState>,
    /// Last request that reached this game (for idle timeout)
    last_active: Arc<StdMutex<Instant>>,
}

impl GameHandle {
    /// Deliver an event and wait for the runtime to apply it
    pub async fn send(&self, event: Event) -> Result<GameState, GameError> {
        let (ack, ack_rx) = oneshot::channel();
        self.command_tx
            .send(Command { event, ack })
            .await
            .map_err(|_| GameError::Closed)?;
        ack_rx.await.map_err(|_| GameError::Closed)??;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> GameState {
        self.state_rx.borrow().clone()
    }

    fn activity(&self) -> MutexGuard<'_, Instant> {
        self.last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        *self.activity() = Instant::now();
    }

    /// Untouched for longer than `timeout` and nobody is streaming it
    fn is_idle(&self, timeout: Duration) -> bool {
        self.activity().elapsed() > timeout && self.broadcast_tx.receiver_count() == 0
    }
}

/// Listing entry for a running game
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub id: String,
    pub mode: GameMode,
    pub created_at: DateTime<Utc>,
    pub state: GameState,
}

/// Manager for all game runtimes
pub struct GameManager {
    provider: TransportProvider,
    limits: GameLimits,
    games: RwLock<HashMap<String, GameHandle>>,
}

impl GameManager {
    /// Create the manager and start the idle sweep
    pub fn new(provider: TransportProvider, limits: GameLimits) -> Arc<Self> {
        let manager = Arc::new(Self {
            provider,
            limits,
            games: RwLock::new(HashMap::new()),
        });

        // Weak reference, so the sweep ends with the manager
        let manager_weak = Arc::downgrade(&manager);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                let Some(manager) = manager_weak.upgrade() else {
                    tracing::debug!("GameManager dropped, idle sweep exiting");
                    break;
                };
                manager.evict_idle().await;
            }
        });

        manager
    }

    pub fn provider(&self) -> &TransportProvider {
        &self.provider
    }

    /// Spawn a runtime for a new game and start its first round
    ///
    /// The game is only listed once its runtime has accepted the start.
    pub async fn create(&self, mode: GameMode) -> Result<(String, GameState), GameError> {
        if self.games.read().await.len() >= self.limits.max_games {
            tracing::warn!(max_games = self.limits.max_games, "Refusing new game");
            return Err(GameError::AtCapacity(self.limits.max_games));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let context = GameContext::new(&id);
        let transport = self.provider.transport_for(mode);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_BUFFER);
        let (state_tx, state_rx) = watch::channel(GameState::new(mode));

        let runtime: ProductionRuntime = GameRuntime::new(
            context,
            GameState::new(mode),
            transport,
            command_rx,
            state_tx,
            broadcast_tx.clone(),
        );

        let game_id = id.clone();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(game_id = %game_id, "Game runtime finished");
        });

        let handle = GameHandle {
            mode,
            created_at: Utc::now(),
            command_tx,
            broadcast_tx,
            state_rx,
            last_active: Arc::new(StdMutex::new(Instant::now())),
        };
        let state = handle.send(Event::StartGame).await?;
        self.games.write().await.insert(id.clone(), handle);

        tracing::info!(game_id = %id, mode = mode.as_str(), transport = self.provider.label(), "Created game");
        Ok((id, state))
    }

    async fn handle(&self, game_id: &str) -> Result<GameHandle, GameError> {
        let handle = self
            .games
            .read()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::NotFound(game_id.to_string()))?;
        handle.touch();
        Ok(handle)
    }

    /// Send a player intent to a game
    pub async fn send_event(&self, game_id: &str, event: Event) -> Result<GameState, GameError> {
        let handle = self.handle(game_id).await?;
        handle.send(event).await
    }

    pub async fn snapshot(&self, game_id: &str) -> Result<GameState, GameError> {
        Ok(self.handle(game_id).await?.snapshot())
    }

    /// Subscribe to game updates
    ///
    /// The receiver is created before the snapshot is taken, so nothing
    /// published after the snapshot is missed.
    pub async fn subscribe(
        &self,
        game_id: &str,
    ) -> Result<(GameState, broadcast::Receiver<SseEvent>), GameError> {
        let handle = self.handle(game_id).await?;
        let rx = handle.broadcast_tx.subscribe();
        Ok((handle.snapshot(), rx))
    }

    #[cfg(test)]
    pub async fn watch(&self, game_id: &str) -> Result<watch::Receiver<GameState>, GameError> {
        Ok(self.handle(game_id).await?.state_rx)
    }

    /// Drop a game; its runtime stops once the last handle is gone
    pub async fn remove(&self, game_id: &str) -> Result<(), GameError> {
        if self.games.write().await.remove(game_id).is_none() {
            return Err(GameError::NotFound(game_id.to_string()));
        }
        tracing::info!(game_id = %game_id, "Removed game");
        Ok(())
    }

    /// Drop every game that has been idle past the timeout
    ///
    /// Returns how many were dropped. A reply still in flight for an evicted
    /// game is discarded when it lands.
    pub async fn evict_idle(&self) -> usize {
        let timeout = self.limits.idle_timeout;
        let mut games = self.games.write().await;
        let before = games.len();
        games.retain(|id, handle| {
            let idle = handle.is_idle(timeout);
            if idle {
                tracing::info!(game_id = %id, "Evicting idle game");
            }
            !idle
        });
        before - games.len()
    }

    /// All games, oldest first
    pub async fn list(&self) -> Vec<GameSummary> {
        let mut games: Vec<GameSummary> = self
            .games
            .read()
            .await
            .iter()
            .map(|(id, handle)| GameSummary {
                id: id.clone(),
                mode: handle.mode,
                created_at: handle.created_at,
                state: handle.snapshot(),
            })
            .collect();
        games.sort_by_key(|g| g.created_at);
        games
    }
}
