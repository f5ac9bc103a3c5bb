//! File-backed source
//!
//! Serves stock movements from a JSON document on disk. The document is
//! expected to be an array of record objects; anything else is handed back
//! as-is so the engine can treat it as a malformed payload.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use regex::RegexBuilder;
use serde_json::Value;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::error::SourceError;
use crate::query::{DeletionQuery, GlobalQuery};
use crate::{field_string, record_type, related_id, TransactionSource};

/// Transaction source reading a JSON file
pub struct JsonFileSource {
    path: PathBuf,
    document: RwLock<Option<Value>>,
}

impl JsonFileSource {
    /// Create an unloaded source for `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            document: RwLock::new(None),
        }
    }

    /// Create a source and load it immediately
    pub async fn open(path: PathBuf) -> Result<Self, SourceError> {
        let source = Self::new(path);
        source.reload().await?;
        Ok(source)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Re-read the document from disk, returning the number of top-level entries
    pub async fn reload(&self) -> Result<usize, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let document: Value = serde_json::from_str(&content)?;
        let count = document.as_array().map(|records| records.len()).unwrap_or(0);

        log::info!(
            target: "boxtrail::source",
            "Loaded {} record(s) from {}",
            count,
            self.path.display()
        );

        *self.document.write().await = Some(document);
        Ok(count)
    }

    async fn select<F>(&self, keep: F) -> Result<Value, SourceError>
    where
        F: Fn(&Value) -> bool,
    {
        let guard = self.document.read().await;
        let document = guard.as_ref().ok_or(SourceError::NotLoaded)?;

        match document {
            Value::Array(records) => Ok(Value::Array(
                records.iter().filter(|r| keep(r)).cloned().collect(),
            )),
            other => Ok(other.clone()),
        }
    }
}

/// UTC date of a record's `created_at`. Offset timestamps are converted;
/// naive ones are read as UTC.
fn created_date(value: &Value) -> Option<NaiveDate> {
    let created_at = field_string(value, "created_at")?;
    let created_at = created_at.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(created_at) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    let prefix = created_at.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn flagged_deletion(value: &Value) -> bool {
    ["is_deletion", "is_deleted"]
        .iter()
        .any(|key| value.get(*key).and_then(Value::as_bool).unwrap_or(false))
}

fn matches_item(value: &Value, item_id: Option<&str>) -> bool {
    match item_id {
        Some(id) => related_id(value, "item").as_deref() == Some(id),
        None => true,
    }
}

/// The legacy backend only narrows `delete`, and only to the exact type.
/// Every other kind is left to the caller's classifier, which also knows
/// aliases such as `new_item` or `item_added`.
fn matches_kind(value: &Value, kind: Option<&str>) -> bool {
    match kind {
        Some(k) if k.eq_ignore_ascii_case("delete") => record_type(value)
            .map(|t| t.eq_ignore_ascii_case("delete"))
            .unwrap_or(false),
        _ => true,
    }
}

fn matches_dates(value: &Value, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    let date = match created_date(value) {
        Some(date) => date,
        None => return true,
    };
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

#[async_trait]
impl TransactionSource for JsonFileSource {
    async fn box_transactions(&self, box_id: &str) -> Result<Value, SourceError> {
        self.select(|record| related_id(record, "box").as_deref() == Some(box_id))
            .await
    }

    async fn global_transactions(&self, query: &GlobalQuery) -> Result<Value, SourceError> {
        self.select(|record| {
            matches_item(record, query.item_id.as_deref())
                && matches_kind(record, query.kind.as_deref())
                && matches_dates(record, query.start_date, query.end_date)
        })
        .await
    }

    async fn deletion_transactions(&self, query: &DeletionQuery) -> Result<Value, SourceError> {
        let pattern = RegexBuilder::new(&query.predicate)
            .case_insensitive(true)
            .build()
            .map_err(|e| SourceError::InvalidPredicate {
                predicate: query.predicate.clone(),
                message: e.to_string(),
            })?;

        self.select(|record| {
            let by_flag = query.is_deletion && flagged_deletion(record);
            let by_type = record_type(record)
                .map(|t| pattern.is_match(&t))
                .unwrap_or(false);
            (by_flag || by_type) && matches_item(record, query.item_id.as_deref())
        })
        .await
    }
}
