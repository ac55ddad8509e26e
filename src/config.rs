//! Environment configuration

use crate::intake::verdict::parse_flag;
use crate::intake::{IntakeContext, DEFAULT_GREETING};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("FRICTION_API_URL must start with http:// or https://, got {0}")]
    InvalidApiUrl(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub store_path: PathBuf,
    pub app_password: Option<String>,
    pub greeting: String,
    pub context: IntakeContext,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = var("FRICTION_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let store_path = var("FRICTION_STORE_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home)
                    .join(".friction-finder")
                    .join("client.db")
            },
            PathBuf::from,
        );

        let mut context = IntakeContext {
            name: var("FRICTION_NAME"),
            email: var("FRICTION_EMAIL"),
            location: var("FRICTION_LOCATION"),
            consent: var("FRICTION_CONSENT").is_some_and(|v| parse_flag(&v)),
            ..IntakeContext::default()
        };
        if let Some(team) = var("FRICTION_TEAM") {
            context.team = team;
        }
        if let Some(role) = var("FRICTION_ROLE") {
            context.role = role;
        }

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            store_path,
            app_password: var("FRICTION_APP_PASSWORD"),
            greeting: var("FRICTION_GREETING").unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            context,
        })
    }
}
