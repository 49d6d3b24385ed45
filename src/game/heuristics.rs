//! Text policies over free-form model replies
//!
//! These are heuristics: a reply can signal a guess without any of the
//! phrases below, and a question can contain them by accident.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Phrases that mark an AI reply as its final guess
const GUESS_PHRASES: &[&str] = &[
    "my final guess",
    "my guess is",
    "i think it is",
    "i'm going to guess",
    "i believe it is",
];

/// From this many answered questions on, "is it <word>" counts as a guess
const GUESS_PATTERN_MIN_TURN: u32 = 10;

static IS_IT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bis it [a-z]").expect("valid regex"));

static LEADING_IS_IT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^is it\s+").expect("valid regex"));

/// Kind of answer given to a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    Yes,
    No,
    Sometimes,
    Unsure,
}

/// Classify a reply by its leading word
pub fn classify(reply: &str) -> AnswerType {
    let lower = reply.trim().to_lowercase();
    if lower.starts_with("yes") {
        AnswerType::Yes
    } else if lower.starts_with("no") {
        AnswerType::No
    } else if lower.starts_with("maybe") || lower.starts_with("sometimes") {
        AnswerType::Sometimes
    } else {
        AnswerType::Unsure
    }
}

/// Whether an AI reply is its final guess
///
/// `turn_count` is the number of questions answered before this reply.
pub fn is_final_guess(reply: &str, turn_count: u32) -> bool {
    let lower = reply.to_lowercase();
    GUESS_PHRASES.iter().any(|phrase| lower.contains(phrase))
        || (turn_count >= GUESS_PATTERN_MIN_TURN && IS_IT_PATTERN.is_match(&lower))
}

/// Compress a question and its answer into a log entry
///
/// "Is it a fruit?" answered yes becomes "Is a fruit"; answered no, "Not a fruit".
pub fn shorten_question(question: &str, answer: AnswerType) -> String {
    let stripped = question.trim().trim_end_matches('?').trim();
    let stripped = LEADING_IS_IT.replace(stripped, "");
    match answer {
        AnswerType::Yes => format!("Is {stripped}"),
        AnswerType::No => format!("Not {stripped}"),
        AnswerType::Sometimes => format!("Sometimes {stripped}"),
        AnswerType::Unsure => format!("Unsure if {stripped}"),
    }
}
