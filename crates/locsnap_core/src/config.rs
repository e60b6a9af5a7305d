//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Collect database path, geocoding credentials and timing knobs.
//! - Provide defaults that work without any environment set.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Malformed numeric values are rejected, never silently defaulted.

use crate::gateway::geocoding::DEFAULT_OPENCAGE_BASE_URL;
use crate::logging::default_log_level;
use crate::service::acquirer::DEFAULT_ACQUIRE_TIMEOUT;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "LOCSNAP_DB_PATH";
pub const ENV_OPENCAGE_API_KEY: &str = "OPENCAGE_API_KEY";
pub const ENV_GEOCODING_URL: &str = "LOCSNAP_GEOCODING_URL";
pub const ENV_ACQUIRE_TIMEOUT_MS: &str = "LOCSNAP_ACQUIRE_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "LOCSNAP_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "locsnap_locations.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTimeout { value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeout { value } => write!(
                f,
                "{ENV_ACQUIRE_TIMEOUT_MS} must be a positive number of milliseconds, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub opencage_api_key: Option<String>,
    pub geocoding_url: String,
    pub acquire_timeout: Duration,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            opencage_api_key: None,
            geocoding_url: DEFAULT_OPENCAGE_BASE_URL.to_string(),
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut cfg = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            cfg.db_path = PathBuf::from(path);
        }
        match read(ENV_OPENCAGE_API_KEY) {
            Some(key) => cfg.opencage_api_key = Some(key),
            None => warn!("event=config_load module=config status=missing_api_key"),
        }
        if let Some(url) = read(ENV_GEOCODING_URL) {
            cfg.geocoding_url = url;
        }
        if let Some(raw) = read(ENV_ACQUIRE_TIMEOUT_MS) {
            cfg.acquire_timeout = parse_timeout_ms(&raw)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            cfg.log_level = level;
        }
        Ok(cfg)
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout {
            value: raw.to_string(),
        }),
    }
}
