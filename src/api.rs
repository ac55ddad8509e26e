//! Friction Finder backend API
//!
//! Typed client for the analyzer, dashboard, pain point, report and demo
//! seeding endpoints.

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind};
pub use types::{
    BacklogEntry, CategoryCount, DashboardMetrics, DemoSeedSummary, PainPointDetail,
    PainPointFilter, PainPointListItem, QuickWin, TeamHeat,
};
