//! Client-held intake state: transcript, respondent context and last verdict

use super::snapshot::Snapshot;
use super::transcript::Transcript;
use super::verdict::{IntakeContext, Verdict};

#[derive(Debug, Clone, PartialEq)]
pub struct IntakeSession {
    pub transcript: Transcript,
    pub context: IntakeContext,
    pub verdict: Option<Verdict>,
    greeting: String,
}

impl IntakeSession {
    pub fn new(greeting: impl Into<String>, context: IntakeContext) -> Self {
        let greeting = greeting.into();
        Self {
            transcript: Transcript::new(greeting.clone()),
            context,
            verdict: None,
            greeting,
        }
    }

    /// Start from a stored snapshot when one is available.
    ///
    /// A non-empty stored transcript replaces the greeting-only default; a
    /// stored verdict becomes the current verdict. Either half may be missing.
    pub fn restore(
        snapshot: Option<Snapshot>,
        greeting: impl Into<String>,
        context: IntakeContext,
    ) -> Self {
        let mut session = Self::new(greeting, context);
        let Some(snapshot) = snapshot else {
            return session;
        };

        if let Some(transcript) = Transcript::from_turns(snapshot.messages, &session.greeting) {
            session.transcript = transcript;
        }
        session.verdict = snapshot.result;
        session
    }

    /// The persisted unit: transcript plus last verdict
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.transcript.turns().to_vec(), self.verdict.clone())
    }

    /// New-session initialization: greeting only, no verdict. Context is kept.
    pub fn reset(&mut self) {
        self.transcript = Transcript::new(self.greeting.clone());
        self.verdict = None;
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }
}
