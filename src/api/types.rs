//! Dashboard and pain point response types

use crate::intake::PainCategory;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamHeat {
    pub team: String,
    #[serde(default)]
    pub categories: BTreeMap<String, u32>,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogEntry {
    pub pain_point_id: i64,
    pub title: String,
    pub team: String,
    pub category: String,
    pub impact_hours_per_week: f64,
    pub effort_score: f64,
    pub confidence_score: f64,
    pub priority_score: f64,
    pub automation_type: String,
    pub suggested_solution: String,
    pub owner_suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickWin {
    pub pain_point_id: i64,
    pub title: String,
    pub team: String,
    pub impact_hours_per_week: f64,
    pub priority_score: f64,
}

/// `GET /dashboard`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_pain_points: u32,
    pub total_hours_per_week: f64,
    #[serde(default)]
    pub top_categories: Vec<CategoryCount>,
    #[serde(default)]
    pub team_heatmap: Vec<TeamHeat>,
    #[serde(default)]
    pub top_backlog: Vec<BacklogEntry>,
    #[serde(default)]
    pub quick_wins: Vec<QuickWin>,
}

/// Row of `GET /pain-points`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainPointListItem {
    pub id: i64,
    pub title: String,
    pub category: PainCategory,
    pub team: String,
    pub role: String,
    pub priority_score: Option<f64>,
    pub impact_hours_per_week: Option<f64>,
    pub effort_score: Option<i64>,
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub quick_win: bool,
    pub sensitive_flag: bool,
}

/// `GET /pain-points/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainPointDetail {
    pub id: i64,
    pub interview_id: i64,
    pub respondent_id: i64,
    pub team: String,
    pub role: String,
    pub title: String,
    pub description: String,
    pub category: PainCategory,
    pub frequency_per_week: f64,
    pub minutes_per_occurrence: f64,
    pub people_affected: i64,
    #[serde(default)]
    pub systems_involved: Vec<String>,
    pub current_workaround: Option<String>,
    pub failure_modes: Option<String>,
    pub success_definition: Option<String>,
    pub sensitive_flag: bool,
    pub redaction_notes: Option<String>,
    pub transcript_redacted: Option<String>,
    pub summary_text: String,
    pub score_id: Option<i64>,
    pub impact_hours_per_week: Option<f64>,
    pub effort_score: Option<i64>,
    pub confidence_score: Option<f64>,
    pub priority_score: Option<f64>,
    #[serde(default)]
    pub quick_win: bool,
    pub automation_type: Option<String>,
    pub suggested_solution: Option<String>,
    pub owner_suggestion: Option<String>,
    #[serde(deserialize_with = "utc_or_naive")]
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed servers drop the offset; such timestamps are UTC.
fn utc_or_naive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(at) = raw.parse::<DateTime<Utc>>() {
        return Ok(at);
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Row counts created by `POST /demo/seed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoSeedSummary {
    pub respondents: u32,
    pub interviews: u32,
    pub pain_points: u32,
}

/// Server-side filters for `GET /pain-points`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PainPointFilter {
    pub team: Option<String>,
    pub category: Option<PainCategory>,
    pub priority_min: Option<f64>,
}

impl PainPointFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(team) = self.team.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            pairs.push(("team", team.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(min) = self.priority_min.filter(|m| m.is_finite()) {
            pairs.push(("priority_min", min.to_string()));
        }
        pairs
    }
}
