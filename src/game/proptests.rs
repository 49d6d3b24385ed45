//! Property-based tests for the game reducers
//!
//! Random sequences of intents and replies, checked against the invariants
//! both modes share.

use super::heuristics::classify;
use super::*;
use crate::llm::TransportError;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> GameContext {
    GameContext::new("prop-game")
}

/// Events tagged so replies can target the current generation at apply time
#[derive(Debug, Clone)]
enum Step {
    Intent(Event),
    Reply(String),
    StaleReply(String),
    Failure,
}

fn resolve(step: Step, state: &GameState) -> Event {
    match step {
        Step::Intent(event) => event,
        Step::Reply(text) => Event::ReplyReceived {
            generation: state.generation,
            text,
        },
        Step::StaleReply(text) => Event::ReplyReceived {
            generation: state.generation.saturating_sub(1),
            text,
        },
        Step::Failure => Event::ReplyFailed {
            generation: state.generation,
            error: TransportError::network("connection reset"),
        },
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_mode() -> impl Strategy<Value = GameMode> {
    prop_oneof![Just(GameMode::AiGuesser), Just(GameMode::UserGuesser)]
}

fn arb_reply_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Yes.".to_string()),
        Just("No.".to_string()),
        Just("Sometimes.".to_string()),
        Just("Is it a piano?".to_string()),
        Just("My final guess is a lamp".to_string()),
        "[a-zA-Z ?]{0,30}",
    ]
}

fn arb_intent() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(|text| Event::Answer { text }),
        any::<bool>().prop_map(|correct| Event::Verdict { correct }),
        "[a-z ?]{0,12}".prop_map(|question| Event::Ask { question }),
        "[a-z ]{0,12}".prop_map(|text| Event::Guess { text }),
        Just(Event::GiveUp),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => arb_intent().prop_map(Step::Intent),
        4 => arb_reply_text().prop_map(Step::Reply),
        1 => arb_reply_text().prop_map(Step::StaleReply),
        1 => Just(Step::Failure),
        1 => Just(Step::Intent(Event::Restart)),
    ]
}

fn started(mode: GameMode) -> GameState {
    match transition(&GameState::new(mode), &test_context(), Event::StartGame) {
        Ok(result) => result.new_state,
        Err(e) => panic!("start failed: {e}"),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Counts stay in range and only move forward within a round
    #[test]
    fn prop_turn_count_bounded_and_monotonic(
        mode in arb_mode(),
        steps in proptest::collection::vec(arb_step(), 0..80)
    ) {
        let ctx = test_context();
        let mut state = started(mode);

        for step in steps {
            let event = resolve(step, &state);
            if let Ok(result) = transition(&state, &ctx, event) {
                let next = result.new_state;
                prop_assert!(next.turn_count <= ctx.max_questions);
                if next.generation == state.generation {
                    prop_assert!(next.turn_count >= state.turn_count);
                    prop_assert!(next.transcript.len() >= state.transcript.len());
                    prop_assert!(next.phase.rank() >= state.phase.rank());
                } else {
                    prop_assert_eq!(next.generation, state.generation + 1);
                    prop_assert_eq!(next.turn_count, 0);
                    prop_assert_eq!(next.transcript.len(), 1);
                }
                state = next;
            }
        }
    }

    // While a reply is pending, every round intent is refused
    #[test]
    fn prop_busy_rejects_intents(
        mode in arb_mode(),
        steps in proptest::collection::vec(arb_step(), 0..40),
        intent in arb_intent()
    ) {
        let ctx = test_context();
        let mut state = started(mode);
        for step in steps {
            let event = resolve(step, &state);
            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
            }
        }

        if state.is_thinking() {
            let err = transition(&state, &ctx, intent).unwrap_err();
            prop_assert_eq!(err, TransitionError::Busy);
        }
    }

    // Replies from an older generation never change anything
    #[test]
    fn prop_stale_replies_ignored(mode in arb_mode(), text in arb_reply_text()) {
        let ctx = test_context();
        let state = started(mode);
        let restarted = transition(&state, &ctx, Event::Restart).unwrap().new_state;

        let result = transition(
            &restarted,
            &ctx,
            Event::ReplyReceived { generation: state.generation, text },
        ).unwrap();
        prop_assert_eq!(result.new_state, restarted);
        prop_assert!(result.effects.is_empty());
    }

    // Error and result states accept restart and nothing else
    #[test]
    fn prop_terminal_states_only_restart(mode in arb_mode(), intent in arb_intent()) {
        let ctx = test_context();
        let state = started(mode);
        let failed = transition(
            &state,
            &ctx,
            Event::ReplyFailed {
                generation: state.generation,
                error: TransportError::rate_limit("slow down"),
            },
        ).unwrap().new_state;

        prop_assert!(transition(&failed, &ctx, intent).is_err());
        let restarted = transition(&failed, &ctx, Event::Restart).unwrap().new_state;
        prop_assert!(restarted.is_thinking());
    }

    // Transcript grows by exactly two per completed exchange
    #[test]
    fn prop_transcript_length(mode in arb_mode(), answered in 0u32..20) {
        let ctx = test_context();
        let mut state = started(mode);
        state = transition(&state, &ctx, Event::ReplyReceived {
            generation: state.generation,
            text: "Ready".to_string(),
        }).unwrap().new_state;

        for _ in 0..answered {
            let intent = match mode {
                GameMode::AiGuesser => Event::Answer { text: "No".to_string() },
                GameMode::UserGuesser => Event::Ask { question: "Is it big?".to_string() },
            };
            state = transition(&state, &ctx, intent).unwrap().new_state;
            state = transition(&state, &ctx, Event::ReplyReceived {
                generation: state.generation,
                text: "No, does it bark?".to_string(),
            }).unwrap().new_state;
        }

        prop_assert_eq!(state.transcript.len(), 2 + 2 * answered as usize);
        let expected = match mode {
            GameMode::AiGuesser => answered + 1,
            GameMode::UserGuesser => answered,
        };
        prop_assert_eq!(state.turn_count, expected);
    }

    #[test]
    fn prop_classify_ignores_surrounding_whitespace(text in "[a-zA-Z ]{0,20}") {
        prop_assert_eq!(classify(&format!("  {text}\n")), classify(&text));
    }
}
