//! Pure state transition function
//!
//! Given the current orchestration state, the client-held session and an
//! event, decide the next state and the effects to run. No I/O happens here.

use super::{Effect, Event, IntakeState};
use crate::intake::{AnalysisRequest, IntakeSession, Turn, Verdict};
use thiserror::Error;

const FALLBACK_FAILURE: &str = "Failed to send message";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: IntakeState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: IntakeState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Why an event was not accepted. None of these are fatal; the state is left
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Analysis in progress, wait for the current reply")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Nothing to analyze yet")]
    NothingToAnalyze,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &IntakeState,
    session: &IntakeSession,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Context edits apply to future calls only; in-flight requests
        // already carry their own copy.
        (_, Event::ContextUpdated { context }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::UpdateContext { context }))
        }

        // ============================================================
        // User input
        // ============================================================
        (IntakeState::Idle, Event::UserMessage { text }) => {
            let turn = Turn::user_input(&text).ok_or(TransitionError::EmptyMessage)?;

            let mut messages = session.transcript.eligible_for_analysis();
            messages.push(turn.clone());
            let request = AnalysisRequest::new(messages, session.context.clone(), false);

            Ok(TransitionResult::new(IntakeState::AwaitingVerdict {
                request: request.clone(),
            })
            .with_effect(Effect::AppendTurn { turn })
            .with_effect(Effect::PersistSnapshot)
            .with_effect(Effect::NotifyState {
                state: "awaiting_verdict",
            })
            .with_effect(Effect::request(request)))
        }

        (IntakeState::Idle, Event::CommitRequested) => {
            if !session.transcript.has_content() {
                return Err(TransitionError::NothingToAnalyze);
            }
            let request = AnalysisRequest::new(
                session.transcript.eligible_for_analysis(),
                session.context.clone(),
                true,
            );

            Ok(TransitionResult::new(IntakeState::AwaitingCommit {
                request: request.clone(),
            })
            .with_effect(Effect::NotifyState {
                state: "awaiting_commit",
            })
            .with_effect(Effect::request(request)))
        }

        (IntakeState::Idle, Event::Reset) => Ok(TransitionResult::new(IntakeState::Idle)
            .with_effect(Effect::ResetSession)
            .with_effect(Effect::PersistSnapshot)),

        (
            IntakeState::AwaitingVerdict { .. } | IntakeState::AwaitingCommit { .. },
            Event::UserMessage { .. } | Event::CommitRequested | Event::Reset,
        ) => Err(TransitionError::Busy),

        // ============================================================
        // Analyzer responses
        // ============================================================

        // Valid and sufficiently informed: commit against the same request.
        // The first verdict is superseded and never shown.
        (IntakeState::AwaitingVerdict { request }, Event::VerdictReceived { verdict })
            if verdict.is_ready_to_commit() =>
        {
            let commit = request.committing();
            Ok(TransitionResult::new(IntakeState::AwaitingCommit {
                request: commit.clone(),
            })
            .with_effect(Effect::NotifyState {
                state: "awaiting_commit",
            })
            .with_effect(Effect::request(commit)))
        }

        (
            IntakeState::AwaitingVerdict { .. } | IntakeState::AwaitingCommit { .. },
            Event::VerdictReceived { verdict },
        ) => Ok(settle(verdict)),

        (
            IntakeState::AwaitingVerdict { .. } | IntakeState::AwaitingCommit { .. },
            Event::AnalysisFailed { message, kind },
        ) => {
            let message = if message.trim().is_empty() {
                FALLBACK_FAILURE.to_string()
            } else {
                message
            };
            Ok(TransitionResult::new(IntakeState::Idle).with_effects([
                Effect::NotifyState { state: "idle" },
                Effect::NotifyFailure { message, kind },
            ]))
        }

        (IntakeState::Idle, Event::VerdictReceived { .. } | Event::AnalysisFailed { .. }) => Err(
            TransitionError::InvalidTransition("analyzer reply with nothing in flight".to_string()),
        ),
    }
}

/// Apply an authoritative verdict: store it, show its reply, persist
fn settle(verdict: Verdict) -> TransitionResult {
    let reply = verdict.assistant_message.clone();
    TransitionResult::new(IntakeState::Idle).with_effects([
        Effect::StoreVerdict { verdict },
        Effect::append_assistant(reply),
        Effect::PersistSnapshot,
        Effect::NotifyState { state: "idle" },
        Effect::NotifySettled,
    ])
}
