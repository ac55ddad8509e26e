//! Effects produced by state transitions

use crate::api::ApiErrorKind;
use crate::intake::{AnalysisRequest, IntakeContext, Turn, Verdict};

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a turn to the transcript
    AppendTurn { turn: Turn },

    /// Replace the stored verdict
    StoreVerdict { verdict: Verdict },

    /// Write the transcript + verdict snapshot
    PersistSnapshot,

    /// Issue an analyzer call (spawned; completes with a later event)
    RequestAnalysis { request: AnalysisRequest },

    /// Start over with a greeting-only transcript and no verdict
    ResetSession,

    /// Replace the respondent context used for future calls
    UpdateContext { context: IntakeContext },

    /// Notify subscribers of the new orchestration state
    NotifyState { state: &'static str },

    /// Sequence finished with an authoritative verdict
    NotifySettled,

    /// Sequence finished with a failure
    NotifyFailure { message: String, kind: ApiErrorKind },
}

impl Effect {
    pub fn append_user(content: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: Turn::user(content),
        }
    }

    pub fn append_assistant(content: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: Turn::assistant(content),
        }
    }

    pub fn request(request: AnalysisRequest) -> Self {
        Effect::RequestAnalysis { request }
    }
}
