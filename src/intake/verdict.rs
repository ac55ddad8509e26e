//! Analyzer request and verdict types
//!
//! These are the wire shapes of `POST /chatbot/coo`. The verdict is also the
//! `result` half of the persisted chat snapshot, so everything here must
//! round-trip through JSON without loss.

use super::transcript::Turn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TEAM: &str = "COO Office";
pub const DEFAULT_ROLE: &str = "COO";

/// Respondent metadata sent alongside every analysis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeContext {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_team")]
    pub team: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Informational only; enforcement happens server side
    #[serde(default)]
    pub consent: bool,
}

fn default_team() -> String {
    DEFAULT_TEAM.to_string()
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl Default for IntakeContext {
    fn default() -> Self {
        Self {
            name: None,
            email: None,
            team: default_team(),
            role: default_role(),
            location: None,
            consent: false,
        }
    }
}

impl IntakeContext {
    /// Apply a single `key=value` edit. Empty values clear optional fields
    /// and reset team/role to their defaults.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), UnknownField> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match key.trim() {
            "name" => self.name = optional(),
            "email" => self.email = optional(),
            "location" => self.location = optional(),
            "team" => self.team = optional().unwrap_or_else(default_team),
            "role" => self.role = optional().unwrap_or_else(default_role),
            "consent" => self.consent = parse_flag(value),
            other => return Err(UnknownField(other.to_string())),
        }
        Ok(())
    }
}

/// Loose boolean parsing used for env vars and `/context consent=...`
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown context field: {0} (expected name, email, team, role, location or consent)")]
pub struct UnknownField(pub String);

/// Pain point category as classified by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PainCategory {
    Onboarding,
    Approvals,
    Reporting,
    Comms,
    FinanceOps,
    SalesOps,
    ClientOps,
    AccessMgmt,
    #[default]
    #[serde(other)]
    Other,
}

impl PainCategory {
    pub const ALL: [PainCategory; 9] = [
        PainCategory::Onboarding,
        PainCategory::Approvals,
        PainCategory::Reporting,
        PainCategory::Comms,
        PainCategory::FinanceOps,
        PainCategory::SalesOps,
        PainCategory::ClientOps,
        PainCategory::AccessMgmt,
        PainCategory::Other,
    ];

    /// Exact id lookup; unlike deserialization, unknown ids are not `Other`
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PainCategory::Onboarding => "onboarding",
            PainCategory::Approvals => "approvals",
            PainCategory::Reporting => "reporting",
            PainCategory::Comms => "comms",
            PainCategory::FinanceOps => "finance_ops",
            PainCategory::SalesOps => "sales_ops",
            PainCategory::ClientOps => "client_ops",
            PainCategory::AccessMgmt => "access_mgmt",
            PainCategory::Other => "other",
        }
    }
}

impl fmt::Display for PainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a single analyzer call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub messages: Vec<Turn>,
    pub context: IntakeContext,
    pub add_to_report: bool,
}

impl AnalysisRequest {
    pub fn new(messages: Vec<Turn>, context: IntakeContext, add_to_report: bool) -> Self {
        Self {
            messages,
            context,
            add_to_report,
        }
    }

    /// Same turns and context, with commit switched on
    pub fn committing(&self) -> Self {
        Self {
            add_to_report: true,
            ..self.clone()
        }
    }
}

/// Structured analyzer verdict. Replaced wholesale on every successful call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub assistant_message: String,
    pub valid_concern: bool,
    pub needs_more_info: bool,
    #[serde(default)]
    pub category: PainCategory,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub estimated_impact_hours_per_week: f64,
    #[serde(default)]
    pub added_to_report: bool,
    #[serde(default)]
    pub interview_id: Option<i64>,
    #[serde(default)]
    pub respondent_id: Option<i64>,
    #[serde(default)]
    pub pain_point_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl Verdict {
    /// Valid and sufficiently informed: the only verdict that triggers an
    /// automatic commit call.
    pub fn is_ready_to_commit(&self) -> bool {
        self.valid_concern && !self.needs_more_info
    }

    /// One-line status shown under the conversation
    pub fn headline(&self) -> &'static str {
        if self.is_ready_to_commit() {
            "Valid concern detected."
        } else {
            "Listening and building signal."
        }
    }

    /// Root cause, if the analyzer had enough signal to name one
    pub fn root_cause_signal(&self) -> Option<&str> {
        self.root_cause
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Backlog confirmation line, present only once committed
    pub fn backlog_summary(&self) -> Option<String> {
        if !self.added_to_report {
            return None;
        }
        let ids: Vec<String> = self.pain_point_ids.iter().map(ToString::to_string).collect();
        Some(format!(
            "Added to report backlog. Pain point IDs: {}",
            ids.join(", ")
        ))
    }
}
