//! User Guesser transitions: the player asks, the AI answers

use super::heuristics::{classify, shorten_question, AnswerType};
use super::state::{GameContext, GameState, LoggedQuestion, Outcome, Phase};
use super::transition::{
    record_reply, require_text, send_player_turn, TransitionError, TransitionResult,
};
use super::{Effect, Event};
use crate::llm::RequestKind;
use crate::system_prompt::{
    final_guess_message, GIVE_UP_MESSAGE, LAST_QUESTION_MARKER, QUESTION_LIMIT_NOTICE,
};

pub(super) fn transition(
    state: &GameState,
    context: &GameContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.phase, event) {
        // "Ready" message; nothing has been asked yet
        (
            Phase::Playing {
                awaiting: Some(RequestKind::Opening),
            },
            Event::ReplyReceived { text, .. },
        ) => {
            let (new_state, turn) = record_reply(state, Phase::Playing { awaiting: None }, text);
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::notify_turn(&turn))
                .with_effect(Effect::PublishState))
        }

        (Phase::Playing { awaiting: None }, Event::Ask { question }) => {
            if state.turn_count >= context.max_questions {
                return Err(TransitionError::QuestionLimitReached(context.max_questions));
            }
            let question = require_text(&question)?;
            let wire_text = (state.turn_count + 1 == context.max_questions)
                .then(|| format!("{question}{LAST_QUESTION_MARKER}"));
            Ok(send_player_turn(
                state,
                Phase::Playing {
                    awaiting: Some(RequestKind::Turn),
                },
                question,
                RequestKind::Turn,
                wire_text,
            ))
        }

        (
            Phase::Playing {
                awaiting: Some(RequestKind::Turn),
            },
            Event::ReplyReceived { text, .. },
        ) => {
            let answer = classify(&text);
            let question = state.last_human_text().unwrap_or_default().to_string();
            let turn_count = state.turn_count + 1;
            let limit_reached = turn_count >= context.max_questions;
            let phase = if limit_reached {
                Phase::FinalGuess {
                    final_answer: None,
                    awaiting: None,
                }
            } else {
                Phase::Playing { awaiting: None }
            };

            let (mut new_state, turn) = record_reply(state, phase, text);
            new_state.turn_count = turn_count;
            new_state.question_log.push(LoggedQuestion {
                summary: shorten_question(&question, answer),
                question,
                answer,
            });

            let notice = limit_reached.then(|| Effect::notice(QUESTION_LIMIT_NOTICE));
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::notify_turn(&turn))
                .with_effects(notice)
                .with_effect(Effect::PublishState))
        }

        (Phase::FinalGuess { awaiting: None, .. }, Event::Guess { text }) => {
            let guess = require_text(&text)?;
            Ok(send_player_turn(
                state,
                Phase::FinalGuess {
                    final_answer: None,
                    awaiting: Some(RequestKind::FinalGuess),
                },
                final_guess_message(&guess),
                RequestKind::FinalGuess,
                None,
            ))
        }

        (Phase::FinalGuess { awaiting: None, .. }, Event::GiveUp) => Ok(send_player_turn(
            state,
            Phase::FinalGuess {
                final_answer: None,
                awaiting: Some(RequestKind::Reveal),
            },
            GIVE_UP_MESSAGE.to_string(),
            RequestKind::Reveal,
            None,
        )),

        (
            Phase::FinalGuess {
                awaiting: Some(kind @ (RequestKind::FinalGuess | RequestKind::Reveal)),
                ..
            },
            Event::ReplyReceived { text, .. },
        ) => {
            let outcome = match kind {
                RequestKind::Reveal => Outcome::Unknown,
                _ if classify(&text) == AnswerType::Yes => Outcome::Correct,
                _ => Outcome::Incorrect,
            };
            let phase = Phase::Result {
                outcome,
                final_answer: Some(text.clone()),
            };
            let (new_state, turn) = record_reply(state, phase, text);
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::notify_turn(&turn))
                .with_effect(Effect::PublishState))
        }

        (_, event @ (Event::Answer { .. } | Event::Verdict { .. })) => {
            Err(TransitionError::WrongMode {
                intent: event.name(),
                mode: "user_guesser",
            })
        }

        (_, event) => Err(TransitionError::invalid(&event, state)),
    }
}
