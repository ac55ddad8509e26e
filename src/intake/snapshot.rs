//! Persisted chat snapshot
//!
//! Wire form is `{ "messages": Turn[], "result": Verdict | null }`, written
//! wholesale under a single key. Reading is deliberately forgiving: each half
//! is decoded on its own, and anything unreadable counts as absent.

use super::transcript::Turn;
use super::verdict::Verdict;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local store key holding the intake snapshot
pub const SNAPSHOT_KEY: &str = "ff_coo_chat_state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub messages: Vec<Turn>,
    pub result: Option<Verdict>,
}

impl Snapshot {
    pub fn new(messages: Vec<Turn>, result: Option<Verdict>) -> Self {
        Self { messages, result }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a stored snapshot. Returns `None` when nothing usable is there.
    pub fn from_json(raw: &str) -> Option<Self> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable intake snapshot");
                return None;
            }
        };
        let object = value.as_object()?;

        let messages = object
            .get("messages")
            .and_then(|m| serde_json::from_value::<Vec<Turn>>(m.clone()).ok())
            .unwrap_or_default();
        let result = object
            .get("result")
            .and_then(|r| serde_json::from_value::<Option<Verdict>>(r.clone()).ok())
            .flatten();

        if messages.is_empty() && result.is_none() {
            return None;
        }
        Some(Self { messages, result })
    }
}
