//! Mock transports and a harness for runtime tests
//!
//! These mocks drive a real [`GameRuntime`] without network I/O.

use super::{Command, GameRuntime, SseEvent};
use crate::game::{Event, GameContext, GameMode, GameState, TransitionError};
use crate::llm::{ChatReply, ChatRequest, ChatTransport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch, Notify};

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued replies
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ChatReply::text(text)));
    }

    /// Queue an error reply
    pub fn queue_error(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock reply queued")))
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Gated Transport (for busy and restart testing)
// ============================================================================

/// Transport that holds every request until the test releases it
pub struct GatedTransport {
    inner: MockTransport,
    gate: Notify,
    started: Notify,
}

#[allow(dead_code)]
impl GatedTransport {
    pub fn new() -> Self {
        Self {
            inner: MockTransport::new(),
            gate: Notify::new(),
            started: Notify::new(),
        }
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.inner.queue_reply(text);
    }

    /// Let one held request complete
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Wait until a request is being held
    pub async fn wait_for_request(&self) {
        self.started.notified().await;
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ChatTransport for GatedTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.started.notify_one();
        self.gate.notified().await;
        self.inner.send(request).await
    }

    fn model_id(&self) -> &str {
        "gated"
    }
}

// ============================================================================
// Test Game Harness
// ============================================================================

/// A running game wired to a test transport
pub struct TestGame<T: ChatTransport + 'static> {
    pub command_tx: mpsc::Sender<Command>,
    pub state_rx: watch::Receiver<GameState>,
    pub broadcast_rx: broadcast::Receiver<SseEvent>,
    pub transport: Arc<T>,
    _runtime_handle: tokio::task::JoinHandle<()>,
}

impl<T: ChatTransport + 'static> TestGame<T> {
    pub fn start(mode: GameMode, transport: T) -> Self {
        let transport = Arc::new(transport);
        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(128);
        let (state_tx, state_rx) = watch::channel(GameState::new(mode));

        let runtime = GameRuntime::new(
            GameContext::new("test-game"),
            GameState::new(mode),
            Arc::clone(&transport),
            command_rx,
            state_tx,
            broadcast_tx,
        );
        let handle = tokio::spawn(async move {
            runtime.run().await;
        });

        Self {
            command_tx,
            state_rx,
            broadcast_rx,
            transport,
            _runtime_handle: handle,
        }
    }

    /// Send an intent and wait for its acknowledgement
    pub async fn send(&self, event: Event) -> Result<(), TransitionError> {
        let (ack, ack_rx) = oneshot::channel();
        self.command_tx
            .send(Command { event, ack })
            .await
            .expect("runtime alive");
        ack_rx.await.expect("runtime acknowledged")
    }

    pub fn state(&self) -> GameState {
        self.state_rx.borrow().clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_until(
        &mut self,
        predicate: impl FnMut(&GameState) -> bool,
        timeout: Duration,
    ) -> Option<GameState> {
        match tokio::time::timeout(timeout, self.state_rx.wait_for(predicate)).await {
            Ok(Ok(state)) => Some(state.clone()),
            _ => None,
        }
    }

    /// Wait for a phase by its serialized name
    pub async fn wait_for_phase(&mut self, phase: &str, timeout: Duration) -> bool {
        self.wait_until(|s| s.phase.name() == phase && !s.is_thinking(), timeout)
            .await
            .is_some()
    }

    /// Wait until no reply is pending
    pub async fn wait_for_idle(&mut self, timeout: Duration) -> GameState {
        self.wait_until(|s| s.is_started() && !s.is_thinking(), timeout)
            .await
            .expect("game settled in time")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{state::Speaker, Outcome, Phase};
    use crate::llm::{RequestKind, ScriptedTransport, TransportErrorKind};
    use crate::system_prompt::LAST_QUESTION_MARKER;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_mock_transport() {
        let mock = MockTransport::new();
        mock.queue_reply("Is it alive?");
        let request = ChatRequest {
            system: "sys".into(),
            messages: vec![],
            max_tokens: None,
            kind: RequestKind::Opening,
        };

        let reply = mock.send(&request).await.unwrap();
        assert_eq!(reply.text, "Is it alive?");
        assert_eq!(mock.recorded_requests().len(), 1);

        let err = mock.send(&request).await.unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Network);
    }

    #[tokio::test]
    async fn test_ai_guesser_round_trip() {
        let mock = MockTransport::new();
        mock.queue_reply("Is it a living thing?");
        mock.queue_reply("Is it bigger than a car?");
        let mut game = TestGame::start(GameMode::AiGuesser, mock);

        game.send(Event::StartGame).await.unwrap();
        let state = game.wait_for_idle(TIMEOUT).await;
        assert_eq!(state.turn_count, 1);

        let answer = Event::Answer { text: "No".into() };
        game.send(answer).await.unwrap();
        let state = game.wait_for_idle(TIMEOUT).await;
        assert_eq!(state.turn_count, 2);
        assert_eq!(state.transcript.len(), 4);
        assert_eq!(state.transcript[3].speaker, Speaker::Assistant);

        let requests = game.transport.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[2].content, "No");
    }

    #[tokio::test]
    async fn test_scripted_piano_game() {
        let transport = ScriptedTransport::for_mode(GameMode::AiGuesser, Duration::ZERO);
        let mut game = TestGame::start(GameMode::AiGuesser, transport);

        game.send(Event::StartGame).await.unwrap();
        let mut state = game.wait_for_idle(TIMEOUT).await;
        for _ in 1..20 {
            assert!(matches!(state.phase, Phase::Playing { .. }));
            let answer = Event::Answer { text: "Yes".into() };
            game.send(answer).await.unwrap();
            state = game.wait_for_idle(TIMEOUT).await;
        }

        assert_eq!(state.turn_count, 20);
        assert_eq!(state.transcript.len(), 2 * 19 + 2);
        assert!(state.final_answer().unwrap().contains("piano"));

        game.send(Event::Verdict { correct: true }).await.unwrap();
        assert!(game.wait_for_phase("result", TIMEOUT).await);
        assert_eq!(game.state().outcome(), Some(Outcome::Correct));
    }

    #[tokio::test]
    async fn test_scripted_banana_game() {
        let transport = ScriptedTransport::for_mode(GameMode::UserGuesser, Duration::ZERO);
        let mut game = TestGame::start(GameMode::UserGuesser, transport);

        game.send(Event::StartGame).await.unwrap();
        game.wait_for_idle(TIMEOUT).await;
        for n in 1..=20 {
            let question = format!("Is it thing {n}?");
            game.send(Event::Ask { question }).await.unwrap();
            game.wait_for_idle(TIMEOUT).await;
        }

        assert!(game.wait_for_phase("final_guess", TIMEOUT).await);
        let text = "a banana".to_string();
        game.send(Event::Guess { text }).await.unwrap();
        assert!(game.wait_for_phase("result", TIMEOUT).await);

        let state = game.state();
        assert_eq!(state.outcome(), Some(Outcome::Correct));
        assert_eq!(state.turn_count, 20);
        assert_eq!(state.question_log.len(), 20);
    }

    #[tokio::test]
    async fn test_last_question_marker_sent_on_wire() {
        let mock = MockTransport::new();
        mock.queue_reply("Ready!");
        for _ in 0..20 {
            mock.queue_reply("No.");
        }
        let mut game = TestGame::start(GameMode::UserGuesser, mock);

        game.send(Event::StartGame).await.unwrap();
        game.wait_for_idle(TIMEOUT).await;
        for _ in 0..20 {
            let question = "Is it big?".to_string();
            game.send(Event::Ask { question }).await.unwrap();
            game.wait_for_idle(TIMEOUT).await;
        }

        let requests = game.transport.recorded_requests();
        let last_request = requests.last().unwrap();
        let last_wire = &last_request.messages.last().unwrap().content;
        assert!(last_wire.ends_with(LAST_QUESTION_MARKER));
        assert_eq!(game.state().last_human_text(), Some("Is it big?"));

        let notice = loop {
            match game.broadcast_rx.try_recv() {
                Ok(SseEvent::Notice { message }) => break Some(message),
                Ok(_) => continue,
                Err(_) => break None,
            }
        };
        assert!(notice.is_some());
    }

    #[tokio::test]
    async fn test_busy_while_reply_pending() {
        let gated = GatedTransport::new();
        gated.queue_reply("Is it alive?");
        let mut game = TestGame::start(GameMode::AiGuesser, gated);

        game.send(Event::StartGame).await.unwrap();
        game.transport.wait_for_request().await;

        let answer = Event::Answer { text: "Yes".into() };
        let err = game.send(answer).await.unwrap_err();
        assert_eq!(err, TransitionError::Busy);
        assert!(game.state().is_thinking());

        game.transport.release();
        let state = game.wait_for_idle(TIMEOUT).await;
        assert_eq!(state.turn_count, 1);
        assert_eq!(game.transport.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_restart_during_request_discards_old_round() {
        let gated = GatedTransport::new();
        gated.queue_reply("Is it alive?");
        gated.queue_reply("Is it alive?");
        let mut game = TestGame::start(GameMode::AiGuesser, gated);

        game.send(Event::StartGame).await.unwrap();
        game.transport.wait_for_request().await;

        // Restart while the opening request is held
        game.send(Event::Restart).await.unwrap();
        game.transport.wait_for_request().await;
        assert_eq!(game.state().generation, 2);

        game.transport.release();
        game.transport.release();
        let state = game.wait_for_idle(TIMEOUT).await;
        assert_eq!(state.generation, 2);

        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while game.transport.recorded_requests().len() < 2 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "both requests completed"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Only the reply for the current round was applied
        let state = game.state();
        assert_eq!(state.transcript.len(), 2);
        assert_eq!(state.turn_count, 1);
        assert!(!state.is_thinking());
    }

    #[tokio::test]
    async fn test_transport_error_then_restart() {
        let mock = MockTransport::new();
        mock.queue_error(TransportError::auth("Authentication failed"));
        mock.queue_reply("Is it an animal?");
        let mut game = TestGame::start(GameMode::AiGuesser, mock);

        game.send(Event::StartGame).await.unwrap();
        assert!(game.wait_for_phase("error", TIMEOUT).await);
        let Phase::Error { kind, .. } = game.state().phase else {
            panic!("expected the error phase");
        };
        assert_eq!(kind, TransportErrorKind::Auth);

        let answer = Event::Answer { text: "Yes".into() };
        let err = game.send(answer).await.unwrap_err();
        assert!(matches!(err, TransitionError::InvalidIntent { .. }));

        game.send(Event::Restart).await.unwrap();
        let state = game.wait_for_idle(TIMEOUT).await;
        assert_eq!(state.turn_count, 1);
        assert_eq!(state.last_assistant_text(), Some("Is it an animal?"));
    }
}
