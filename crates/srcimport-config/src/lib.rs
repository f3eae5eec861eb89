#![deny(unsafe_code)]

//! Configuration loading and validation for srcimport.
//!
//! Loads TOML configuration files and validates them against expected
//! schemas. Provides the [`AppConfig`] type as the central configuration
//! structure. Every field has a sensible default so the tool works with no
//! config file at all; the file only exists to pin network behaviour and
//! GitHub credential lookup.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP client configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// GitHub access configuration.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP client configuration shared by all remote file providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("srcimport/", env!("CARGO_PKG_VERSION")).to_string()
}

/// GitHub access configuration.
///
/// The token is never stored in the config file itself; only the names of
/// the environment variables to probe are configurable. The default order
/// matches the `gh` CLI: `GH_TOKEN`, then `GITHUB_TOKEN`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Environment variables probed, in order, for an access token.
    #[serde(default = "default_token_env_vars")]
    pub token_env_vars: Vec<String>,

    /// Base URL of the GitHub REST API.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Base URL of the raw-content host.
    #[serde(default = "default_raw_host")]
    pub raw_host: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token_env_vars: default_token_env_vars(),
            api_host: default_api_host(),
            raw_host: default_raw_host(),
        }
    }
}

fn default_token_env_vars() -> Vec<String> {
    // https://cli.github.com/manual/gh_help_environment
    vec!["GH_TOKEN".to_string(), "GITHUB_TOKEN".to_string()]
}

fn default_api_host() -> String {
    "https://api.github.com".to_string()
}

fn default_raw_host() -> String {
    "https://raw.githubusercontent.com".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "network.timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.network.user_agent.is_empty() {
            return Err(ConfigError::Validation(
                "network.user_agent must not be empty".to_string(),
            ));
        }

        if self.github.token_env_vars.is_empty() {
            return Err(ConfigError::Validation(
                "github.token_env_vars must list at least one variable name".to_string(),
            ));
        }
        for (i, name) in self.github.token_env_vars.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "github.token_env_vars[{i}] must not be empty"
                )));
            }
        }
        for (key, value) in [
            ("github.api_host", &self.github.api_host),
            ("github.raw_host", &self.github.raw_host),
        ] {
            if !value.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an https:// URL, got {value:?}"
                )));
            }
            if value.ends_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{key} must not have a trailing slash, got {value:?}"
                )));
            }
        }

        Ok(())
    }
}
