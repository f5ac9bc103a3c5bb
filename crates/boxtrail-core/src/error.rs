//! Error types for boxtrail-core
//!
//! Fetch failures are absorbed at the aggregator boundary: they are turned
//! into empty results and reported through an [`ErrorLogger`]. The error
//! codes survive so the view can tell "could not load" from "no matches".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport or backend failure on a query
    SourceUnavailable,
    /// Query answered with something other than an array of records
    MalformedPayload,
    /// Filter input could not be understood
    InvalidFilter,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::SourceUnavailable => write!(f, "SOURCE_UNAVAILABLE"),
            ErrorCode::MalformedPayload => write!(f, "MALFORMED_PAYLOAD"),
            ErrorCode::InvalidFilter => write!(f, "INVALID_FILTER"),
        }
    }
}

/// Serializable error report, used as the API error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_detail(self, detail: serde_json::Value) -> Self {
        Self {
            details: Some(detail),
            ..self
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " {}", details)?;
        }
        for hint in &self.suggestions {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

/// How loudly an absorbed error is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl ErrorSeverity {
    fn level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
        }
    }
}

/// Main error type for boxtrail-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Source unavailable for {query}: {message}")]
    SourceUnavailable { query: String, message: String },

    #[error("Malformed payload from {query}: expected an array, got {found}")]
    MalformedPayload { query: String, found: String },

    #[error("Invalid filter {field}: {message}")]
    InvalidFilter { field: String, message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::SourceUnavailable { .. } => ErrorCode::SourceUnavailable,
            CoreError::MalformedPayload { .. } => ErrorCode::MalformedPayload,
            CoreError::InvalidFilter { .. } => ErrorCode::InvalidFilter,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::SourceUnavailable { .. } => ErrorSeverity::Error,
            CoreError::MalformedPayload { .. } => ErrorSeverity::Warning,
            CoreError::InvalidFilter { .. } => ErrorSeverity::Info,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::SourceUnavailable { query, .. } => {
                details = details.with_detail(serde_json::json!({ "query": query }));
                details = details.with_suggestion(
                    "The result was treated as empty; retry once the backend is reachable.".to_string(),
                );
            }
            CoreError::MalformedPayload { query, found } => {
                details = details.with_detail(serde_json::json!({ "query": query, "found": found }));
            }
            CoreError::InvalidFilter { field, .. } => {
                details = details.with_detail(serde_json::json!({ "field": field }));
                details = details.with_suggestion(
                    "Dates use YYYY-MM-DD; kinds are all, in, out, transfer, update, create, delete."
                        .to_string(),
                );
            }
        }

        details
    }
}

/// Where an error happened, attached to every report
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub operation: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ErrorContext {
    pub fn new(operation: String) -> Self {
        Self {
            operation,
            data: serde_json::Map::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }
}

/// Collaborator that receives absorbed fetch failures
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_debug(&self, message: &str, context: &ErrorContext);
}

/// Writes through the `log` facade under `boxtrail::error`
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::log!(
            target: "boxtrail::error",
            error.severity().level(),
            "{} failed [{}]: {} {:?}",
            context.operation,
            error.code(),
            error,
            context.data
        );
    }

    fn log_debug(&self, message: &str, context: &ErrorContext) {
        log::debug!(target: "boxtrail::error", "{}: {}", context.operation, message);
    }
}

// ==================== Tests ====================
