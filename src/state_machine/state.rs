//! Intake orchestration state

use crate::intake::AnalysisRequest;
use serde::{Deserialize, Serialize};

/// Where the analyze/commit sequence currently stands.
///
/// `Idle → AwaitingVerdict → AwaitingCommit → Idle` for a typed message;
/// `Idle → AwaitingCommit → Idle` for a manual commit. Every non-idle state
/// holds the request in flight so the commit call reuses it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntakeState {
    /// Ready for input, nothing in flight
    #[default]
    Idle,

    /// Analysis call (`add_to_report=false`) in flight
    AwaitingVerdict { request: AnalysisRequest },

    /// Commit call (`add_to_report=true`) in flight
    AwaitingCommit { request: AnalysisRequest },
}

impl IntakeState {
    pub fn is_idle(&self) -> bool {
        matches!(self, IntakeState::Idle)
    }

    pub fn is_busy(&self) -> bool {
        !self.is_idle()
    }

    /// The request currently in flight, if any
    pub fn pending_request(&self) -> Option<&AnalysisRequest> {
        match self {
            IntakeState::Idle => None,
            IntakeState::AwaitingVerdict { request } | IntakeState::AwaitingCommit { request } => {
                Some(request)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntakeState::Idle => "idle",
            IntakeState::AwaitingVerdict { .. } => "awaiting_verdict",
            IntakeState::AwaitingCommit { .. } => "awaiting_commit",
        }
    }
}
