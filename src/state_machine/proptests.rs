//! Property-based tests for the state machine
//!
//! These drive random event sequences through `transition`, applying the
//! session-level effects the way the runtime does, and check the invariants
//! that must hold for every sequence.

use super::*;
use crate::api::ApiErrorKind;
use crate::intake::{
    IntakeContext, IntakeSession, PainCategory, Snapshot, Transcript, Turn, Verdict,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

const GREETING: &str = "Share what is not working operationally.";

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_category() -> impl Strategy<Value = PainCategory> {
    prop_oneof![
        Just(PainCategory::Approvals),
        Just(PainCategory::Reporting),
        Just(PainCategory::FinanceOps),
        Just(PainCategory::Other),
    ]
}

fn arb_verdict() -> impl Strategy<Value = Verdict> {
    (
        "[a-zA-Z ]{1,30}",
        any::<bool>(),
        any::<bool>(),
        arb_category(),
        proptest::option::of("[a-z ]{1,20}"),
        0.0f64..200.0,
        proptest::collection::vec(1i64..10_000, 0..3),
        0i64..2_000_000_000,
    )
        .prop_map(
            |(message, valid, more, category, root_cause, impact, ids, secs)| Verdict {
                assistant_message: message,
                valid_concern: valid,
                needs_more_info: more,
                category,
                root_cause,
                rationale: "signals".to_string(),
                estimated_impact_hours_per_week: impact,
                added_to_report: !ids.is_empty(),
                interview_id: None,
                respondent_id: None,
                pain_point_ids: ids,
                created_at: Utc.timestamp_opt(secs, 0).single().unwrap_or_default(),
            },
        )
}

fn arb_turn() -> impl Strategy<Value = Turn> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,40}".prop_map(Turn::user),
        "[a-zA-Z0-9 ]{1,40}".prop_map(Turn::assistant),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        3 => "[a-zA-Z ]{0,20}".prop_map(Event::user_message),
        1 => Just(Event::CommitRequested),
        1 => Just(Event::Reset),
        3 => arb_verdict().prop_map(|verdict| Event::VerdictReceived { verdict }),
        1 => "[a-z ]{0,10}".prop_map(|message| Event::AnalysisFailed {
            message,
            kind: ApiErrorKind::Network,
        }),
    ]
}

// ============================================================================
// Effect application (mirrors the runtime, minus I/O)
// ============================================================================

#[derive(Default)]
struct Observed {
    requests: Vec<crate::intake::AnalysisRequest>,
}

fn apply(session: &mut IntakeSession, effects: Vec<Effect>, observed: &mut Observed) {
    for effect in effects {
        match effect {
            Effect::AppendTurn { turn } => session.transcript.append(turn),
            Effect::StoreVerdict { verdict } => session.verdict = Some(verdict),
            Effect::ResetSession => session.reset(),
            Effect::UpdateContext { context } => session.context = context,
            Effect::RequestAnalysis { request } => observed.requests.push(request),
            Effect::PersistSnapshot
            | Effect::NotifyState { .. }
            | Effect::NotifySettled
            | Effect::NotifyFailure { .. } => {}
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Eligible turns are exactly the appended turns, in order
    #[test]
    fn prop_eligible_excludes_greeting_and_keeps_order(
        turns in proptest::collection::vec(arb_turn(), 0..12)
    ) {
        let mut transcript = Transcript::new(GREETING);
        for turn in &turns {
            transcript.append(turn.clone());
        }
        prop_assert_eq!(transcript.eligible_for_analysis(), turns.clone());
        prop_assert_eq!(transcript.has_content(), !turns.is_empty());
        prop_assert_eq!(transcript.greeting(), &Turn::assistant(GREETING));
    }

    /// Save-then-load reproduces transcript and verdict exactly
    #[test]
    fn prop_snapshot_round_trip(
        turns in proptest::collection::vec(arb_turn(), 0..8),
        verdict in proptest::option::of(arb_verdict()),
    ) {
        let mut session = IntakeSession::new(GREETING, IntakeContext::default());
        for turn in turns {
            session.transcript.append(turn);
        }
        session.verdict = verdict;

        let json = session.snapshot().to_json().unwrap();
        let restored = IntakeSession::restore(
            Snapshot::from_json(&json),
            GREETING,
            IntakeContext::default(),
        );
        prop_assert_eq!(&restored.transcript, &session.transcript);
        prop_assert_eq!(&restored.verdict, &session.verdict);
    }

    /// Random event sequences never break the orchestration invariants
    #[test]
    fn prop_transition_invariants(events in proptest::collection::vec(arb_event(), 1..30)) {
        let mut state = IntakeState::Idle;
        let mut session = IntakeSession::new(GREETING, IntakeContext::default());

        for event in events {
            let before_state = state.clone();
            let before_turns = session.transcript.turns().to_vec();
            let is_reset = matches!(event, Event::Reset);
            let incoming_verdict = match &event {
                Event::VerdictReceived { verdict } => Some(verdict.clone()),
                _ => None,
            };

            let mut observed = Observed::default();
            match transition(&state, &session, event) {
                Ok(result) => {
                    let effect_count = result
                        .effects
                        .iter()
                        .filter(|e| matches!(e, Effect::RequestAnalysis { .. }))
                        .count();
                    prop_assert!(effect_count <= 1, "at most one call per transition");

                    state = result.new_state;
                    apply(&mut session, result.effects, &mut observed);

                    // A call is issued iff we are now waiting on one, and it is
                    // exactly the request the state holds.
                    match observed.requests.as_slice() {
                        [] => {}
                        [request] => {
                            prop_assert_eq!(state.pending_request(), Some(request));
                            // Everything but the greeting, nothing more
                            prop_assert_eq!(
                                request.messages.as_slice(),
                                &session.transcript.turns()[1..]
                            );
                        }
                        _ => unreachable!(),
                    }

                    // Commit is only automatic after a ready verdict
                    if let (
                        IntakeState::AwaitingVerdict { request: first },
                        IntakeState::AwaitingCommit { request: commit },
                    ) = (&before_state, &state) {
                        prop_assert!(incoming_verdict.as_ref().is_some_and(Verdict::is_ready_to_commit));
                        prop_assert_eq!(&first.messages, &commit.messages);
                        prop_assert!(commit.add_to_report);
                    }
                }
                Err(TransitionError::Busy) => prop_assert!(before_state.is_busy()),
                Err(_) => {}
            }

            // Append-only, except for explicit new-session initialization
            let after = session.transcript.turns();
            if !(is_reset && state.is_idle()) {
                prop_assert!(after.len() >= before_turns.len());
                prop_assert_eq!(&after[..before_turns.len()], before_turns.as_slice());
                prop_assert!(after.len() - before_turns.len() <= 1);
            }
        }
    }
}
