//! Environment-driven pipeline configuration.
//!
//! Everything is read from process environment variables, with a `.env` file
//! loaded first when present. The two API keys are mandatory; league, season,
//! and directory settings carry defaults so a bare deployment works out of
//! the box. Alert settings are optional as a block: when SMTP is not
//! configured the pipeline runs with notifications disabled.

use crate::alert::AlertConfig;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Full runtime configuration for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api_sports_key: String,
    pub api_football_key: String,
    /// Season year, e.g. "2023".
    pub season: String,
    /// League id in API-Sports numbering (39 is the Premier League).
    pub api_sports_league: String,
    /// League id in API-Football numbering (152 is the Premier League).
    pub api_football_league: String,
    /// Root directory for warehouse tables and the metrics CSV.
    pub warehouse_dir: PathBuf,
    /// Where raw payload and transformed-record audit copies go, if anywhere.
    pub artifacts_dir: Option<PathBuf>,
    pub alert: Option<AlertConfig>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

pub(crate) fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl PipelineConfig {
    /// Load configuration from the environment, reading `.env` first if one
    /// exists next to the process.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            api_sports_key: required("API_SPORTS_KEY")?,
            api_football_key: required("API_FOOTBALL_KEY")?,
            season: optional("SEASON").unwrap_or_else(|| "2023".to_string()),
            api_sports_league: optional("API_SPORTS_LEAGUE").unwrap_or_else(|| "39".to_string()),
            api_football_league: optional("API_FOOTBALL_LEAGUE")
                .unwrap_or_else(|| "152".to_string()),
            warehouse_dir: optional("WAREHOUSE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("warehouse")),
            artifacts_dir: optional("ARTIFACTS_DIR").map(PathBuf::from),
            alert: AlertConfig::from_env(),
        };

        tracing::info!(
            season = %config.season,
            api_sports_league = %config.api_sports_league,
            api_football_league = %config.api_football_league,
            warehouse = %config.warehouse_dir.display(),
            alerts = config.alert.is_some(),
            "configuration loaded"
        );
        Ok(config)
    }
}
