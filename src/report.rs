//! Report preview and export options

use crate::store::{LocalStore, StoreResult};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

pub const CURRENCY_KEY: &str = "ff_report_currency";
pub const HOURLY_RATE_KEY: &str = "ff_report_hourly_rate";

pub const DEFAULT_HOURLY_RATE: u32 = 30;
pub const MIN_HOURLY_RATE: u32 = 10;
pub const MAX_HOURLY_RATE: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Gbp,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported currency: {0} (expected GBP, USD or EUR)")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GBP" => Ok(Currency::Gbp),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(UnknownCurrency(other.to_string())),
        }
    }
}

/// Named hourly rates offered alongside a custom value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePreset {
    OpsAnalyst,
    OpsManager,
    SeniorOps,
    HeadOps,
    BlendedConservative,
}

impl RatePreset {
    pub const ALL: [RatePreset; 5] = [
        RatePreset::OpsAnalyst,
        RatePreset::OpsManager,
        RatePreset::SeniorOps,
        RatePreset::HeadOps,
        RatePreset::BlendedConservative,
    ];

    pub fn id(self) -> &'static str {
        match self {
            RatePreset::OpsAnalyst => "ops_analyst",
            RatePreset::OpsManager => "ops_manager",
            RatePreset::SeniorOps => "senior_ops",
            RatePreset::HeadOps => "head_ops",
            RatePreset::BlendedConservative => "blended_conservative",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RatePreset::OpsAnalyst => "Ops analyst",
            RatePreset::OpsManager => "Ops manager",
            RatePreset::SeniorOps => "Senior ops",
            RatePreset::HeadOps => "Head of ops",
            RatePreset::BlendedConservative => "Blended (conservative)",
        }
    }

    pub fn rate(self) -> u32 {
        match self {
            RatePreset::OpsAnalyst => 25,
            RatePreset::OpsManager => 40,
            RatePreset::SeniorOps => 60,
            RatePreset::HeadOps => 85,
            RatePreset::BlendedConservative => 50,
        }
    }

    /// The preset with exactly this rate; anything else is a custom rate
    pub fn for_rate(rate: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.rate() == rate)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id.trim())
    }
}

/// Round and clamp a user-entered rate into the supported range
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_rate(value: f64) -> u32 {
    if !value.is_finite() {
        return DEFAULT_HOURLY_RATE;
    }
    // Clamped before the cast, so the value fits
    value
        .round()
        .clamp(f64::from(MIN_HOURLY_RATE), f64::from(MAX_HOURLY_RATE)) as u32
}

/// Parse a rate argument: a preset id or a number
pub fn parse_rate(input: &str) -> u32 {
    RatePreset::from_id(input)
        .map(RatePreset::rate)
        .unwrap_or_else(|| clamp_rate(input.trim().parse().unwrap_or(f64::NAN)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub currency: Currency,
    pub hourly_rate: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            hourly_rate: DEFAULT_HOURLY_RATE,
        }
    }
}

impl ReportOptions {
    pub fn new(currency: Currency, hourly_rate: f64) -> Self {
        Self {
            currency,
            hourly_rate: clamp_rate(hourly_rate),
        }
    }

    /// Query string shared by the HTML and PDF report endpoints. The server
    /// reads `rate`; `hourly_rate` is sent too for older deployments.
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        let rate = self.hourly_rate.to_string();
        [
            ("currency", self.currency.code().to_string()),
            ("rate", rate.clone()),
            ("hourly_rate", rate),
        ]
    }

    pub fn html_path(&self) -> String {
        format!("/report.html?{}", self.query_string())
    }

    pub fn pdf_path(&self) -> String {
        format!("/report.pdf?{}", self.query_string())
    }

    fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn preset(&self) -> Option<RatePreset> {
        RatePreset::for_rate(self.hourly_rate)
    }

    /// Restore saved preferences; anything missing or unreadable falls back
    /// to the default
    pub fn load(store: &LocalStore) -> Self {
        let currency = store
            .get(CURRENCY_KEY)
            .ok()
            .flatten()
            .and_then(|c| c.parse().ok())
            .unwrap_or_default();
        let hourly_rate = store
            .get(HOURLY_RATE_KEY)
            .ok()
            .flatten()
            .and_then(|r| r.trim().parse::<f64>().ok())
            .map_or(DEFAULT_HOURLY_RATE, clamp_rate);
        Self {
            currency,
            hourly_rate,
        }
    }

    pub fn save(&self, store: &LocalStore) -> StoreResult<()> {
        store.set(CURRENCY_KEY, self.currency.code())?;
        store.set(HOURLY_RATE_KEY, &self.hourly_rate.to_string())
    }
}

/// Download name for the exported PDF
pub fn export_file_name(date: NaiveDate) -> String {
    format!("friction-finder-report-{}.pdf", date.format("%Y%m%d"))
}
