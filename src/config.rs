use crate::datasource::slashgolf::{DEFAULT_API_HOST, DEFAULT_BASE_URL};
use crate::domain::Season;
use chrono_tz::Tz;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub slashgolf_api_url: String,
    pub slashgolf_api_host: String,
    /// Only needed by commands that call the data source.
    pub slashgolf_api_key: Option<String>,
    pub season: Season,
    pub league_tz: Tz,
    pub sync_mode: SyncMode,
    /// League-local hour used as the pick deadline when no tee times exist.
    pub fixed_deadline_hour: u32,
}

/// Data source call budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Standard,
    /// Restrict calls by weekday to stay within the provider's free tier.
    Free,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let slashgolf_api_url = env_map
            .get("SLASHGOLF_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let slashgolf_api_host = env_map
            .get("SLASHGOLF_API_HOST")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string());

        let slashgolf_api_key = env_map
            .get("SLASHGOLF_API_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let season = env_map
            .get("SEASON_YEAR")
            .map(|s| s.as_str())
            .unwrap_or("2026")
            .parse::<i32>()
            .map(Season::new)
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "SEASON_YEAR".to_string(),
                    "must be a year such as 2026".to_string(),
                )
            })?;

        let tz_name = env_map
            .get("LEAGUE_TIMEZONE")
            .map(|s| s.as_str())
            .unwrap_or("America/Chicago");
        let league_tz = tz_name.parse::<Tz>().map_err(|_| {
            ConfigError::InvalidValue(
                "LEAGUE_TIMEZONE".to_string(),
                format!("unknown IANA timezone {}", tz_name),
            )
        })?;

        let sync_mode = match env_map
            .get("SYNC_MODE")
            .map(|s| s.to_lowercase())
            .as_deref()
            .unwrap_or("standard")
        {
            "standard" => SyncMode::Standard,
            "free" => SyncMode::Free,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SYNC_MODE".to_string(),
                    format!("must be standard or free, got {}", other),
                ))
            }
        };

        let fixed_deadline_hour = env_map
            .get("FIXED_DEADLINE_HOUR")
            .map(|s| s.as_str())
            .unwrap_or("7")
            .parse::<u32>()
            .ok()
            .filter(|h| *h < 24)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "FIXED_DEADLINE_HOUR".to_string(),
                    "must be an hour between 0 and 23".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            slashgolf_api_url,
            slashgolf_api_host,
            slashgolf_api_key,
            season,
            league_tz,
            sync_mode,
            fixed_deadline_hour,
        })
    }

    /// The API key, for commands that reach the data source.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.slashgolf_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnv("SLASHGOLF_API_KEY".to_string()))
    }
}
