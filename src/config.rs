//! Configuration management for soccerfetch
//!
//! Multi-source loading with zero-config defaults: built-in values, then an
//! optional TOML file from the standard locations, then environment variable
//! overrides. CLI flags are applied last by the command handlers.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{ClientConfig, MaxAge, ReaderConfig, SessionConfig};
use crate::constants::{env as env_vars, http, limits};
use crate::errors::ConfigError;

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for cached data; `None` uses the platform default
    pub data_dir: Option<PathBuf>,
    /// Always force refresh, ignoring cache freshness
    pub no_cache: bool,
    /// Never write fetched payloads to disk
    pub no_store: bool,
    /// Default maximum cache age in whole days; `None` never expires
    pub max_age_days: Option<u64>,
    /// HTTP client settings
    pub client: ClientSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// User agent sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Fixed delay after each request (e.g. "500ms", "2s")
    #[serde(with = "humantime_serde")]
    pub rate_limit_base_delay: Duration,
    /// Upper bound for the random delay added after each request
    #[serde(with = "humantime_serde")]
    pub rate_limit_max_jitter: Duration,
    /// Maximum download attempts per URL
    pub max_attempts: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            rate_limit_base_delay: limits::RATE_LIMIT_BASE_DELAY,
            rate_limit_max_jitter: limits::RATE_LIMIT_MAX_JITTER,
            max_attempts: limits::MAX_ATTEMPTS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if one exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            debug!("Loading config from: {}", path.display());
            config = Self::load_from_file(&path).await?;
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Resolve the effective data directory
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("soccerfetch")
                .join("data"),
        }
    }

    /// Convert to the runtime reader configuration
    pub fn to_reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            data_dir: self.data_dir(),
            no_cache: self.no_cache,
            no_store: self.no_store,
            default_max_age: self.max_age_days.map(MaxAge::Days),
            client: ClientConfig {
                session: SessionConfig {
                    user_agent: self.client.user_agent.clone(),
                    request_timeout: Duration::from_secs(self.client.request_timeout_secs),
                    connect_timeout: Duration::from_secs(self.client.connect_timeout_secs),
                    ..SessionConfig::default()
                },
                rate_limit_rps: self.client.rate_limit_rps,
                rate_limit_base_delay: self.client.rate_limit_base_delay,
                rate_limit_max_jitter: self.client.rate_limit_max_jitter,
                max_attempts: self.client.max_attempts,
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(env_vars::NO_CACHE) {
            self.no_cache = env_truthy(&value);
        }
        if let Ok(value) = std::env::var(env_vars::NO_STORE) {
            self.no_store = env_truthy(&value);
        }
        if let Ok(value) = std::env::var(env_vars::DATA_DIR) {
            self.data_dir = Some(PathBuf::from(value));
        }
        if let Ok(value) = std::env::var(env_vars::MAX_AGE) {
            let days = value
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: env_vars::MAX_AGE.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
            self.max_age_days = Some(days);
        }
        Ok(())
    }

    /// Find a configuration file in the standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut candidates = vec![PathBuf::from("./soccerfetch.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("soccerfetch").join("config.toml"));
        }

        candidates.into_iter().find(|path| path.exists())
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }
}

/// Truthy environment values, matching the historical toggles
fn env_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_cache_enabled_and_unexpiring() {
        let config = AppConfig::default();
        assert!(!config.no_cache);
        assert!(!config.no_store);
        assert!(config.max_age_days.is_none());
        assert_eq!(config.client.max_attempts, limits::MAX_ATTEMPTS);
    }

    #[test]
    fn truthy_values_match_historical_toggles() {
        for value in ["true", "1", "t", "True", "T"] {
            assert!(env_truthy(value), "{value} should be truthy");
        }
        for value in ["false", "0", "yes", ""] {
            assert!(!env_truthy(value), "{value} should be falsy");
        }
    }

    #[test]
    fn toml_round_trip_preserves_durations() {
        let mut config = AppConfig::default();
        config.client.rate_limit_base_delay = Duration::from_millis(500);
        config.client.rate_limit_max_jitter = Duration::from_secs(2);

        let serialized = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(
            parsed.client.rate_limit_base_delay,
            Duration::from_millis(500)
        );
        assert_eq!(parsed.client.rate_limit_max_jitter, Duration::from_secs(2));
    }

    #[test]
    fn reader_config_carries_max_age_in_days() {
        let config = AppConfig {
            max_age_days: Some(3),
            ..AppConfig::default()
        };
        let reader = config.to_reader_config();
        assert_eq!(reader.default_max_age, Some(MaxAge::Days(3)));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let parsed: AppConfig = toml::from_str("no_store = true\n").unwrap();
        assert!(parsed.no_store);
        assert!(!parsed.no_cache);
        assert_eq!(parsed.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
    }
}
