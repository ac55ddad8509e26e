//! Conversation accumulator
//!
//! The transcript always starts with a synthetic assistant greeting. The
//! greeting is shown to the user but is never sent to the analyzer and never
//! counts as something to analyze.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GREETING: &str =
    "Share what is not working operationally, and I will help unpack the root cause step by step.";

/// Turn author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Build a user turn from raw input. Returns `None` when nothing is left
    /// after trimming.
    pub fn user_input(raw: &str) -> Option<Self> {
        let content = raw.trim();
        if content.is_empty() {
            None
        } else {
            Some(Self::user(content))
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Ordered, append-only conversation. Index 0 is the greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}

impl Transcript {
    /// Fresh transcript holding only the greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    /// Rebuild a transcript from stored turns.
    ///
    /// A conversation always opens with the assistant, so a leading assistant
    /// turn is taken to be the greeting and kept verbatim. Stored turns that
    /// open with a user turn get `greeting` prepended. Returns `None` for an
    /// empty sequence.
    pub fn from_turns(turns: Vec<Turn>, greeting: &str) -> Option<Self> {
        match turns.first() {
            None => None,
            Some(first) if first.role == Role::Assistant => Some(Self { turns }),
            Some(_) => {
                let mut restored = Vec::with_capacity(turns.len() + 1);
                restored.push(Turn::assistant(greeting));
                restored.extend(turns);
                Some(Self { turns: restored })
            }
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn greeting(&self) -> &Turn {
        &self.turns[0]
    }

    /// Every turn, greeting included, in conversation order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns that may be sent to the analyzer: everything after the greeting
    pub fn eligible_for_analysis(&self) -> Vec<Turn> {
        self.turns.iter().skip(1).cloned().collect()
    }

    pub fn has_content(&self) -> bool {
        self.turns.len() > 1
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Never true for a constructed transcript; the greeting is always present
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
