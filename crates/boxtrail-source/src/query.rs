//! Query shapes accepted by upstream sources

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pattern used by the broad deletion query
pub const DELETION_PREDICATE: &str = "delete";

/// Filters for the global transactions query. Sources apply them on a
/// best-effort basis; callers re-filter the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Kind filter token (`in`, `out`, `delete`, ...); `None` for all kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Broader deletion query, issued when the global delete query comes back empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionQuery {
    pub is_deletion: bool,
    /// Case-insensitive regex matched against the record type
    pub predicate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

impl DeletionQuery {
    pub fn new(item_id: Option<String>) -> Self {
        Self {
            is_deletion: true,
            predicate: DELETION_PREDICATE.to_string(),
            item_id,
        }
    }
}
