//! Upstream stock movement sources
//!
//! A source answers the three queries the engine issues: the box-scoped
//! query, the global query and the broad deletion query. Payloads are
//! returned as raw JSON so the caller decides what a well-formed answer is.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub mod error;
pub mod file;
pub mod query;

pub use error::SourceError;
pub use file::JsonFileSource;
pub use query::{DeletionQuery, GlobalQuery, DELETION_PREDICATE};

/// Source reference type
pub type SourceRef = Arc<dyn TransactionSource>;

/// Trait for upstream transaction queries
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// All movements of one box, any kind, in no particular order
    async fn box_transactions(&self, box_id: &str) -> Result<Value, SourceError>;

    /// Movements matching the global filters
    async fn global_transactions(&self, query: &GlobalQuery) -> Result<Value, SourceError>;

    /// Movements flagged as deletions or whose type matches the predicate
    async fn deletion_transactions(&self, query: &DeletionQuery) -> Result<Value, SourceError>;
}

// ==================== Field Helpers ====================

/// Read a field as a string, accepting strings and numbers
pub fn field_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Record type, whichever of the known field names carries it
pub fn record_type(value: &Value) -> Option<String> {
    ["type", "transaction_type", "raw_type", "action"]
        .iter()
        .find_map(|key| field_string(value, key))
}

/// Identifier of a related entity, either flat (`item_id`) or nested (`item.id`)
pub fn related_id(value: &Value, entity: &str) -> Option<String> {
    field_string(value, &format!("{}_id", entity))
        .or_else(|| value.get(entity).and_then(|nested| field_string(nested, "id")))
}
