//! AI Guesser transitions: the AI asks, the player answers

use super::heuristics::is_final_guess;
use super::state::{GameContext, GameState, Outcome, Phase};
use super::transition::{
    record_reply, require_text, send_player_turn, TransitionError, TransitionResult,
};
use super::{Effect, Event};
use crate::llm::RequestKind;

pub(super) fn transition(
    state: &GameState,
    context: &GameContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.phase, event) {
        // Opening reply is the first question
        (
            Phase::Playing {
                awaiting: Some(RequestKind::Opening),
            },
            Event::ReplyReceived { text, .. },
        ) => {
            let (mut new_state, turn) =
                record_reply(state, Phase::Playing { awaiting: None }, text);
            new_state.turn_count = 1;
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::notify_turn(&turn))
                .with_effect(Effect::PublishState))
        }

        // Next question, or the AI commits to a guess
        (
            Phase::Playing {
                awaiting: Some(RequestKind::Turn),
            },
            Event::ReplyReceived { text, .. },
        ) => {
            let answered = state.turn_count;
            let turn_count = (answered + 1).min(context.max_questions);
            let phase = if turn_count >= context.max_questions || is_final_guess(&text, answered) {
                Phase::FinalGuess {
                    final_answer: Some(text.clone()),
                    awaiting: None,
                }
            } else {
                Phase::Playing { awaiting: None }
            };

            let (mut new_state, turn) = record_reply(state, phase, text);
            new_state.turn_count = turn_count;
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::notify_turn(&turn))
                .with_effect(Effect::PublishState))
        }

        (Phase::Playing { awaiting: None }, Event::Answer { text }) => {
            let text = require_text(&text)?;
            Ok(send_player_turn(
                state,
                Phase::Playing {
                    awaiting: Some(RequestKind::Turn),
                },
                text,
                RequestKind::Turn,
                None,
            ))
        }

        // The verdict is separate from yes/no answers so judging the guess
        // never gets sent to the model as an answer
        (
            Phase::FinalGuess {
                final_answer,
                awaiting: None,
            },
            Event::Verdict { correct },
        ) => {
            let outcome = if correct {
                Outcome::Correct
            } else {
                Outcome::Incorrect
            };
            let new_state = GameState {
                phase: Phase::Result {
                    outcome,
                    final_answer: final_answer.clone(),
                },
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state).with_effect(Effect::PublishState))
        }

        (_, event @ (Event::Ask { .. } | Event::Guess { .. } | Event::GiveUp)) => {
            Err(TransitionError::WrongMode {
                intent: event.name(),
                mode: "ai_guesser",
            })
        }

        (_, event) => Err(TransitionError::invalid(&event, state)),
    }
}
