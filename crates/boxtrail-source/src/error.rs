//! Error types for boxtrail-source

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Invalid predicate '{predicate}': {message}")]
    InvalidPredicate { predicate: String, message: String },

    #[error("Source unavailable: {message}")]
    Unavailable { message: String },

    #[error("Source not loaded")]
    NotLoaded,
}

impl From<serde_json::Error> for SourceError {
    fn from(error: serde_json::Error) -> Self {
        SourceError::InvalidJson {
            message: error.to_string(),
        }
    }
}
