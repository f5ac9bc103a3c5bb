//! Configuration management for boxtrail
//!
//! Loads and validates the service configuration from a YAML file.
//! Every section is optional and falls back to its defaults.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

/// Upstream record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the JSON document holding the stock movement records
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("./data/transactions.json")
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page when the caller does not ask for a size
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Page sizes a caller may pick from
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_size_options: default_page_size_options(),
        }
    }
}

impl PaginationConfig {
    /// Resolve a requested page size against the allowed options
    pub fn resolve_page_size(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(size) if self.page_size_options.contains(&size) => size,
            _ => self.page_size,
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_page_size_options() -> Vec<usize> {
    vec![10, 25, 50, 100]
}

/// What to do with a fetch response that settles after a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Whichever response settles last replaces the record set
    LastSettledWins,
    /// Responses older than the newest settled request are dropped
    DiscardStale,
}

impl Default for StalePolicy {
    fn default() -> Self {
        StalePolicy::LastSettledWins
    }
}

impl std::str::FromStr for StalePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last_settled_wins" => Ok(StalePolicy::LastSettledWins),
            "discard_stale" => Ok(StalePolicy::DiscardStale),
            _ => Err(format!("Invalid stale policy: {}", s)),
        }
    }
}

impl std::fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StalePolicy::LastSettledWins => write!(f, "last_settled_wins"),
            StalePolicy::DiscardStale => write!(f, "discard_stale"),
        }
    }
}

/// Fetch behaviour
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FetchConfig {
    #[serde(default)]
    pub stale_policy: StalePolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
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

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.pagination.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size".to_string(),
                reason: "Page size must be greater than 0".to_string(),
            });
        }

        if self.pagination.page_size_options.iter().any(|&size| size == 0) {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size_options".to_string(),
                reason: "Page size options must all be greater than 0".to_string(),
            });
        }

        if !self.pagination.page_size_options.contains(&self.pagination.page_size) {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size".to_string(),
                reason: format!(
                    "Page size {} is not one of {:?}",
                    self.pagination.page_size, self.pagination.page_size_options
                ),
            });
        }

        Ok(())
    }

    /// Default configuration file contents
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}
