//! Scripted transport that replays canned replies
//!
//! Used for offline play (`TWENTYQ_USE_MOCK=true`). Each game gets its own
//! instance, so the reply cursor never leaks between games.

use super::types::{ChatReply, ChatRequest, RequestKind};
use super::{ChatTransport, TransportError};
use crate::game::GameMode;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// AI Guesser script: the AI narrows down to "piano" over 20 questions,
/// regardless of what the player answers.
pub const AI_GUESSER_QUESTIONS: [&str; 20] = [
    "Let me start: is this a living thing?",
    "Can you find it indoors?",
    "Would it fit inside a microwave?",
    "Does it serve a decorative purpose?",
    "Can it produce sound?",
    "Does it run on electricity?",
    "Would you call it a musical instrument?",
    "Does it belong to the string family?",
    "Does it have keys?",
    "Can more than one person play it at the same time?",
    "Would you typically find it in a living room?",
    "Does it weigh more than 50 pounds?",
    "Does it have pedals?",
    "Can it play chords?",
    "Does it need to be tuned regularly?",
    "Would you see one in an orchestra?",
    "Does it have black and white keys?",
    "Can you stand it upright against a wall?",
    "Has it been around for more than 200 years?",
    "My final guess: is it a piano?",
];

pub const AI_GUESSER_FALLBACK: &str = "I've run out of questions! My final guess is a piano.";

/// User Guesser script: the AI has "thought of" a banana.
pub const USER_GUESSER_READY_MESSAGE: &str =
    "I've thought of an object! Go ahead and ask me up to 20 yes/no questions to figure out what it is.";

pub const USER_GUESSER_ANSWERS: [&str; 20] = [
    "No.", "No.", "Yes.", "Yes.", "Yes.", "Yes.", "Yes.", "Yes.", "No.", "Yes.", "No.", "Yes.",
    "No.", "Yes.", "No.", "No.", "Yes.", "Yes.", "Yes.", "Yes.",
];

pub const USER_GUESSER_CORRECT_RESPONSE: &str =
    "Yes, that's correct! The answer is a banana! Great job guessing it!";

pub const USER_GUESSER_REVEAL_RESPONSE: &str = "The object I was thinking of was a banana!";

pub const USER_GUESSER_FALLBACK: &str = "Yes.";

/// A canned conversation for one game mode
#[derive(Debug, Clone)]
pub struct Script {
    /// Replies served in order, one per opening/turn request
    pub replies: Vec<String>,
    /// Served once `replies` is exhausted
    pub fallback: String,
    /// Served to the opening request instead of consuming `replies`
    pub ready: Option<String>,
    /// Served to every final-guess request
    pub confirm: Option<String>,
    /// Served to every reveal request
    pub reveal: Option<String>,
}

impl Script {
    pub fn ai_guesser() -> Self {
        Self {
            replies: AI_GUESSER_QUESTIONS.iter().map(ToString::to_string).collect(),
            fallback: AI_GUESSER_FALLBACK.to_string(),
            ready: None,
            confirm: None,
            reveal: None,
        }
    }

    pub fn user_guesser() -> Self {
        Self {
            replies: USER_GUESSER_ANSWERS.iter().map(ToString::to_string).collect(),
            fallback: USER_GUESSER_FALLBACK.to_string(),
            ready: Some(USER_GUESSER_READY_MESSAGE.to_string()),
            confirm: Some(USER_GUESSER_CORRECT_RESPONSE.to_string()),
            reveal: Some(USER_GUESSER_REVEAL_RESPONSE.to_string()),
        }
    }

    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::AiGuesser => Self::ai_guesser(),
            GameMode::UserGuesser => Self::user_guesser(),
        }
    }
}

/// Transport that serves a [`Script`] with an optional artificial delay
pub struct ScriptedTransport {
    script: Script,
    cursor: AtomicUsize,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new(script: Script, delay: Duration) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn for_mode(mode: GameMode, delay: Duration) -> Self {
        Self::new(Script::for_mode(mode), delay)
    }

    /// Index of the next scripted reply
    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> String {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.script
            .replies
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.script.fallback.clone())
    }

    fn reply_for(&self, kind: RequestKind) -> String {
        match kind {
            RequestKind::Opening => {
                self.cursor.store(0, Ordering::SeqCst);
                match &self.script.ready {
                    Some(ready) => ready.clone(),
                    None => self.next_reply(),
                }
            }
            RequestKind::Turn => self.next_reply(),
            RequestKind::FinalGuess => self
                .script
                .confirm
                .clone()
                .unwrap_or_else(|| self.script.fallback.clone()),
            RequestKind::Reveal => self
                .script
                .reveal
                .clone()
                .unwrap_or_else(|| self.script.fallback.clone()),
        }
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ChatReply::text(self.reply_for(request.kind)))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}
