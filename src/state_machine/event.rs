//! Events that drive the intake state machine

use crate::api::ApiErrorKind;
use crate::intake::{IntakeContext, Verdict};

#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
    },
    /// Manual "analyze and add to report"
    CommitRequested,
    /// New-session initialization
    Reset,
    ContextUpdated {
        context: IntakeContext,
    },

    // Analyzer events
    VerdictReceived {
        verdict: Verdict,
    },
    AnalysisFailed {
        message: String,
        kind: ApiErrorKind,
    },
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Event::UserMessage { text: text.into() }
    }
}
