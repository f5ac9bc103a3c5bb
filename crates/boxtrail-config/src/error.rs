//! Config loading errors

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigErrorCode {
    FileNotFound,
    InvalidYaml,
    InvalidValue,
    Unreadable,
}

impl ConfigErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ConfigErrorCode::InvalidYaml => "INVALID_YAML",
            ConfigErrorCode::InvalidValue => "INVALID_VALUE",
            ConfigErrorCode::Unreadable => "UNREADABLE",
        }
    }
}

impl std::fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Printable report of a config error, shown once at startup
#[derive(Debug, Clone, Serialize)]
pub struct ConfigErrorDetails {
    pub code: ConfigErrorCode,
    pub message: String,
    /// Dotted path, e.g. `pagination.page_size`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl std::fmt::Display for ConfigErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config error [{}]: {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, "\n  at {}", field)?;
        }
        for hint in &self.suggestions {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {path} does not exist")]
    FileNotFound { path: String },

    #[error("config is not valid YAML: {message}")]
    InvalidYaml { message: String },

    #[error("{field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("cannot read config file {path}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn code(&self) -> ConfigErrorCode {
        match self {
            ConfigError::FileNotFound { .. } => ConfigErrorCode::FileNotFound,
            ConfigError::InvalidYaml { .. } => ConfigErrorCode::InvalidYaml,
            ConfigError::InvalidValue { .. } => ConfigErrorCode::InvalidValue,
            ConfigError::Unreadable { .. } => ConfigErrorCode::Unreadable,
        }
    }

    pub fn to_details(&self) -> ConfigErrorDetails {
        let (field, suggestions) = match self {
            ConfigError::FileNotFound { .. } => (
                None,
                vec![
                    "pass --config with the path of an existing file".to_string(),
                    "run with --print-default-config for a starting template".to_string(),
                ],
            ),
            ConfigError::InvalidValue { field, .. } => (Some(field.clone()), Vec::new()),
            ConfigError::Unreadable { source, .. } => (None, vec![source.to_string()]),
            ConfigError::InvalidYaml { .. } => (None, Vec::new()),
        };

        ConfigErrorDetails {
            code: self.code(),
            message: self.to_string(),
            field,
            suggestions,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
