//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::fetch::FetcherConfig;
use crate::parse_duration;
use crate::season::SeasonConfig;

/// Environment variable that overrides `upstream.api_key`.
pub const API_KEY_ENV: &str = "STANDINGS_API_KEY";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Upstream games API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the games API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key, sent as the Authorization header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Results per page (1-100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Request timeout, e.g. "30s" or "2m"
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

fn default_base_url() -> String {
    "https://api.balldontlie.io/v1".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_timeout() -> String {
    "30s".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            per_page: default_per_page(),
            timeout: default_timeout(),
        }
    }
}

impl UpstreamConfig {
    /// Build the HTTP client configuration.
    pub fn fetcher_config(&self) -> Result<FetcherConfig, ConfigError> {
        let timeout = parse_duration(&self.timeout).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid upstream timeout: {}", self.timeout))
        })?;

        Ok(FetcherConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            per_page: self.per_page,
            timeout,
            ..FetcherConfig::default()
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub season: SeasonConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            upstream: UpstreamConfig::default(),
            server: ServerConfig::default(),
            season: SeasonConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise defaults, then apply the
    /// API key environment override and validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_api_key(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        log_level: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self.validate()?;
        Ok(self)
    }

    /// Replace the upstream API key when `key` is non-empty.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.upstream.api_key = Some(key);
        }
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().parse::<LevelFilter>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Log level must be one of off, error, warn, info, debug, trace; got '{}'",
                self.log_level
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.upstream.per_page) {
            return Err(ConfigError::ValidationError(
                "Upstream per_page must be between 1 and 100".to_string(),
            ));
        }

        match parse_duration(&self.upstream.timeout) {
            Some(t) if !t.is_zero() => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Upstream timeout must be a positive duration, got '{}'",
                    self.upstream.timeout
                )))
            }
        }

        if url::Url::parse(&self.upstream.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Upstream base_url is not a valid URL: {}",
                self.upstream.base_url
            )));
        }

        if !self.season.is_valid() {
            return Err(ConfigError::ValidationError(format!(
                "Season start {}-{} is not a valid month/day",
                self.season.start_month, self.season.start_day
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.upstream.per_page, 100);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.season, SeasonConfig::default());
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.upstream.timeout = "0s".to_string();
        assert!(config.validate().is_err());

        config.upstream.timeout = "soon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_per_page() {
        let mut config = AppConfig::default();
        config.upstream.per_page = 250;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_season() {
        let mut config = AppConfig::default();
        config.season.start_month = 2;
        config.season.start_day = 30;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_log_level() {
        let mut config = AppConfig::default();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());

        config.log_level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_are_validated() {
        let config = AppConfig::default()
            .with_overrides(Some(PathBuf::from("/tmp/standings")), Some("warn".to_string()))
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/standings"));
        assert_eq!(config.log_level, "warn");

        let err = AppConfig::default()
            .with_overrides(None, Some("loud".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            data_dir = "/var/lib/standings"

            [upstream]
            api_key = "secret"
            timeout = "2m"

            [season]
            start_month = 9
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/standings"));
        assert_eq!(config.upstream.base_url, "https://api.balldontlie.io/v1");
        assert_eq!(config.upstream.api_key.as_deref(), Some("secret"));
        assert_eq!(config.season.start_month, 9);
        assert_eq!(config.season.start_day, 1);
        assert_eq!(config.server.host, "127.0.0.1");

        let fetcher = config.upstream.fetcher_config().unwrap();
        assert_eq!(fetcher.timeout, Duration::from_secs(120));
        assert_eq!(fetcher.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_api_key_override() {
        let config = AppConfig::default().with_api_key(Some("from-env".to_string()));
        assert_eq!(config.upstream.api_key.as_deref(), Some("from-env"));

        let config = config.with_api_key(Some("  ".to_string()));
        assert_eq!(config.upstream.api_key.as_deref(), Some("from-env"));

        let config = config.with_api_key(None);
        assert_eq!(config.upstream.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("standings.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);

        std::fs::write(&path, "[server]\nport = 0\n").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.season, parsed.season);
    }
}
