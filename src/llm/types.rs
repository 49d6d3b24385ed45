//! Common types for chat completion exchanges

use serde::{Deserialize, Serialize};

/// Chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    /// What the game is waiting for. Live providers ignore this; the scripted
    /// transport uses it to pick the next canned reply.
    pub kind: RequestKind,
}

/// Message in conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Kind of reply a game is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// First exchange of a game (pick an object / ask the first question)
    Opening,
    /// A regular question/answer exchange
    Turn,
    /// The player's final guess, awaiting confirmation
    FinalGuess,
    /// The player gave up and asked for the object
    Reveal,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Opening => "opening",
            RequestKind::Turn => "turn",
            RequestKind::FinalGuess => "final_guess",
            RequestKind::Reveal => "reveal",
        }
    }
}

/// Chat completion reply
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub usage: Usage,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: Usage::default(),
        }
    }
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
