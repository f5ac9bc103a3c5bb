//! Fetch aggregation
//!
//! Picks the upstream query for a scope, falls back to the broad deletion
//! query when a global `delete` query comes back empty, and absorbs every
//! failure into an empty result reported through the [`ErrorLogger`].

use boxtrail_source::{DeletionQuery, GlobalQuery, SourceError, SourceRef};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

use super::error::{CoreError, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger};
use super::filter::FilterState;
use super::models::TransactionRecord;
use super::types::FilterKind;

/// Which records a view is looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    /// Movements of a single box
    Box(String),
    /// Movements across all boxes
    Global,
}

impl std::fmt::Display for FetchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchScope::Box(id) => write!(f, "box:{}", id),
            FetchScope::Global => write!(f, "global"),
        }
    }
}

/// Filters forwarded to the global query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchFilters {
    pub item_id: Option<String>,
    pub kind: FilterKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FetchFilters {
    /// Server-side filters for a filter state, optionally pinned to one item
    pub fn from_state(state: &FilterState, item_id: Option<String>) -> Self {
        Self {
            item_id,
            kind: state.kind(),
            start_date: state.start_date(),
            end_date: state.end_date(),
        }
    }

    fn global_query(&self) -> GlobalQuery {
        GlobalQuery {
            item_id: self.item_id.clone(),
            kind: self.kind.query_token().map(str::to_string),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Records produced by one fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub records: Vec<TransactionRecord>,
    /// Set when the records shown are empty because a query failed
    pub failure: Option<ErrorCode>,
    /// Whether the broad deletion query supplied the records
    pub used_fallback: bool,
}

impl FetchOutcome {
    fn failed(code: ErrorCode) -> Self {
        Self {
            failure: Some(code),
            ..Default::default()
        }
    }
}

/// Issues upstream queries on behalf of transaction views
pub struct FetchAggregator {
    source: SourceRef,
    logger: Arc<dyn ErrorLogger>,
}

impl FetchAggregator {
    pub fn new(source: SourceRef) -> Self {
        Self::with_logger(source, Arc::new(DefaultErrorLogger))
    }

    pub fn with_logger(source: SourceRef, logger: Arc<dyn ErrorLogger>) -> Self {
        Self { source, logger }
    }

    /// Fetch the records for `scope`. Never fails; see [`FetchOutcome::failure`].
    pub async fn fetch_transactions(&self, scope: &FetchScope, filters: &FetchFilters) -> FetchOutcome {
        let context = ErrorContext::new("fetch_transactions".to_string())
            .with_data("scope", serde_json::json!(scope.to_string()))
            .with_data("kind", serde_json::json!(filters.kind.to_string()));

        let primary = match scope {
            FetchScope::Box(box_id) => {
                let result = self.source.box_transactions(box_id).await;
                self.absorb("box_transactions", result, &context)
            }
            FetchScope::Global => {
                let query = filters.global_query();
                let result = self.source.global_transactions(&query).await;
                self.absorb("global_transactions", result, &context)
            }
        };

        let wants_fallback = *scope == FetchScope::Global
            && filters.kind == FilterKind::Delete
            && primary.records.is_empty();
        if !wants_fallback {
            return primary;
        }

        self.logger
            .log_debug("Global delete query returned nothing, trying deletion query", &context);
        let query = DeletionQuery::new(filters.item_id.clone());
        let result = self.source.deletion_transactions(&query).await;
        let fallback = self.absorb("deletion_transactions", result, &context);

        if fallback.records.is_empty() {
            primary
        } else {
            log::info!(
                target: "boxtrail::fetch",
                "Deletion query supplied {} record(s) for {}",
                fallback.records.len(),
                scope
            );
            FetchOutcome {
                used_fallback: true,
                ..fallback
            }
        }
    }

    /// Turn a raw query result into records, logging and swallowing failures
    fn absorb(
        &self,
        query: &str,
        result: Result<Value, SourceError>,
        context: &ErrorContext,
    ) -> FetchOutcome {
        match result {
            Ok(Value::Array(values)) => {
                let records = TransactionRecord::decode_all(&values);
                log::debug!(
                    target: "boxtrail::fetch",
                    "{} returned {} record(s)",
                    query,
                    records.len()
                );
                FetchOutcome {
                    records,
                    ..Default::default()
                }
            }
            Ok(other) => {
                let error = CoreError::MalformedPayload {
                    query: query.to_string(),
                    found: json_kind(&other).to_string(),
                };
                self.logger.log_error(&error, context);
                FetchOutcome::failed(error.code())
            }
            Err(e) => {
                let error = CoreError::SourceUnavailable {
                    query: query.to_string(),
                    message: e.to_string(),
                };
                self.logger.log_error(&error, context);
                FetchOutcome::failed(error.code())
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted source recording the queries it receives
    #[derive(Default)]
    pub(crate) struct ScriptedSource {
        pub box_result: Option<Value>,
        pub global_result: Option<Value>,
        pub deletion_result: Option<Value>,
        pub calls: Mutex<Vec<String>>,
    }

    fn answer(result: &Option<Value>) -> Result<Value, SourceError> {
        result.clone().ok_or(SourceError::Unavailable {
            message: "connection refused".to_string(),
        })
    }

    #[async_trait]
    impl boxtrail_source::TransactionSource for ScriptedSource {
        async fn box_transactions(&self, box_id: &str) -> Result<Value, SourceError> {
            self.calls.lock().unwrap().push(format!("box:{}", box_id));
            answer(&self.box_result)
        }

        async fn global_transactions(&self, query: &GlobalQuery) -> Result<Value, SourceError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("global:{}", query.kind.as_deref().unwrap_or("all")));
            answer(&self.global_result)
        }

        async fn deletion_transactions(&self, query: &DeletionQuery) -> Result<Value, SourceError> {
            self.calls.lock().unwrap().push(format!(
                "deletion:{}:{}",
                query.predicate,
                query.item_id.as_deref().unwrap_or("-")
            ));
            answer(&self.deletion_result)
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingLogger {
        pub errors: Mutex<Vec<ErrorCode>>,
    }

    impl ErrorLogger for RecordingLogger {
        fn log_error(&self, error: &CoreError, _context: &ErrorContext) {
            self.errors.lock().unwrap().push(error.code());
        }

        fn log_debug(&self, _message: &str, _context: &ErrorContext) {}
    }

    fn deletions() -> Value {
        json!([
            { "id": "d1", "type": "bulk_soft_delete", "item_id": 5 },
            { "id": "d2", "type": "ITEM_DELETED", "is_deletion": true, "item_id": 5 }
        ])
    }

    fn delete_filters() -> FetchFilters {
        FetchFilters {
            kind: FilterKind::Delete,
            ..Default::default()
        }
    }

    fn aggregator(source: &Arc<ScriptedSource>, logger: &Arc<RecordingLogger>) -> FetchAggregator {
        FetchAggregator::with_logger(source.clone(), logger.clone())
    }

    #[tokio::test]
    async fn test_box_scope_uses_box_query() {
        let source = Arc::new(ScriptedSource {
            box_result: Some(json!([{ "id": 1, "type": "in" }])),
            ..Default::default()
        });
        let logger = Arc::new(RecordingLogger::default());
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Box("B7".to_string()), &delete_filters())
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(*source.calls.lock().unwrap(), vec!["box:B7"]);
    }

    #[tokio::test]
    async fn test_empty_delete_query_falls_back() {
        let source = Arc::new(ScriptedSource {
            global_result: Some(json!([])),
            deletion_result: Some(deletions()),
            ..Default::default()
        });
        let logger = Arc::new(RecordingLogger::default());
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Global, &delete_filters())
            .await;

        let ids: Vec<_> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
        assert!(outcome.used_fallback);
        assert_eq!(outcome.failure, None);
        assert_eq!(*source.calls.lock().unwrap(), vec!["global:delete", "deletion:delete:-"]);
    }

    #[tokio::test]
    async fn test_fallback_is_scoped_by_item() {
        let source = Arc::new(ScriptedSource {
            global_result: Some(json!([])),
            deletion_result: Some(json!([])),
            ..Default::default()
        });
        let logger = Arc::new(RecordingLogger::default());
        let filters = FetchFilters {
            item_id: Some("5".to_string()),
            ..delete_filters()
        };
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Global, &filters)
            .await;

        assert!(outcome.records.is_empty());
        assert!(!outcome.used_fallback);
        assert_eq!(source.calls.lock().unwrap()[1], "deletion:delete:5");
    }

    #[tokio::test]
    async fn test_no_fallback_when_primary_has_records() {
        let source = Arc::new(ScriptedSource {
            global_result: Some(json!([{ "id": 1, "type": "delete" }])),
            deletion_result: Some(deletions()),
            ..Default::default()
        });
        let logger = Arc::new(RecordingLogger::default());
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Global, &delete_filters())
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_fallback_for_other_kinds() {
        let source = Arc::new(ScriptedSource {
            global_result: Some(json!([])),
            deletion_result: Some(deletions()),
            ..Default::default()
        });
        let logger = Arc::new(RecordingLogger::default());
        let filters = FetchFilters {
            kind: FilterKind::Out,
            ..Default::default()
        };
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Global, &filters)
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(*source.calls.lock().unwrap(), vec!["global:out"]);
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_empty() {
        let source = Arc::new(ScriptedSource::default());
        let logger = Arc::new(RecordingLogger::default());
        let filters = FetchFilters::default();
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Global, &filters)
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failure, Some(ErrorCode::SourceUnavailable));
        assert_eq!(*logger.errors.lock().unwrap(), vec![ErrorCode::SourceUnavailable]);
    }

    #[tokio::test]
    async fn test_failed_primary_still_tries_fallback() {
        let source = Arc::new(ScriptedSource {
            deletion_result: Some(deletions()),
            ..Default::default()
        });
        let logger = Arc::new(RecordingLogger::default());
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Global, &delete_filters())
            .await;

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.failure, None);
        assert_eq!(*logger.errors.lock().unwrap(), vec![ErrorCode::SourceUnavailable]);
    }

    #[tokio::test]
    async fn test_non_array_payload_is_malformed() {
        let source = Arc::new(ScriptedSource {
            box_result: Some(json!({ "error": "nope" })),
            ..Default::default()
        });
        let logger = Arc::new(RecordingLogger::default());
        let outcome = aggregator(&source, &logger)
            .fetch_transactions(&FetchScope::Box("B1".to_string()), &FetchFilters::default())
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failure, Some(ErrorCode::MalformedPayload));
        assert_eq!(*logger.errors.lock().unwrap(), vec![ErrorCode::MalformedPayload]);
    }

    #[test]
    fn test_filters_from_state() {
        let state = FilterState::new(10)
            .with_kind(FilterKind::In)
            .with_start_date(NaiveDate::from_ymd_opt(2024, 1, 1));
        let filters = FetchFilters::from_state(&state, Some("9".to_string()));
        let query = filters.global_query();
        assert_eq!(query.kind.as_deref(), Some("in"));
        assert_eq!(query.item_id.as_deref(), Some("9"));
        assert_eq!(query.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(query.end_date, None);

        let all = FetchFilters::from_state(&FilterState::new(10), None).global_query();
        assert_eq!(all.kind, None);
    }
}
