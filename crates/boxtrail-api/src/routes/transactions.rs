//! Transaction history endpoints
//!
//! Query parameters, all optional:
//! - `kind`: all, in, out, transfer, update, create, delete
//! - `item`: case-insensitive substring of item name or id
//! - `item_id`: pins the upstream query to one item
//! - `start_date`, `end_date`: `YYYY-MM-DD`, both inclusive
//! - `page`, `page_size`: 1-based page; size must be a configured option

use crate::{ApiError, AppState};
use axum::extract::{Path, Query, State};
use axum::Json;
use boxtrail_config::PaginationConfig;
use boxtrail_core::{FetchFilters, FetchScope, FilterKind, FilterState, Projection, TransactionView};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Parsed history request
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub filter: FilterState,
    pub item_id: Option<String>,
}

impl HistoryRequest {
    pub fn from_params(
        params: &HashMap<String, String>,
        pagination: &PaginationConfig,
    ) -> Result<Self, ApiError> {
        let kind = match non_blank(params, "kind") {
            Some(raw) => raw
                .parse::<FilterKind>()
                .map_err(|message| ApiError::invalid_param("kind", message))?,
            None => FilterKind::All,
        };

        let page_size = match parse_number(params, "page_size")? {
            Some(0) => {
                return Err(ApiError::invalid_param("page_size", "Page size must be greater than 0"))
            }
            requested => pagination.resolve_page_size(requested),
        };
        let page = parse_number(params, "page")?.unwrap_or(1);

        let filter = FilterState::new(page_size)
            .with_kind(kind)
            .with_item_query(non_blank(params, "item").unwrap_or_default())
            .with_start_date(parse_date(params, "start_date")?)
            .with_end_date(parse_date(params, "end_date")?)
            .with_page(page);

        Ok(Self {
            filter,
            item_id: non_blank(params, "item_id").map(str::to_string),
        })
    }
}

/// Global history
pub async fn api_transactions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Projection>, ApiError> {
    let request = HistoryRequest::from_params(&params, &state.config.pagination)?;
    Ok(Json(project(&state, FetchScope::Global, request).await))
}

/// History of one box
pub async fn api_box_transactions(
    State(state): State<AppState>,
    Path(box_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Projection>, ApiError> {
    let request = HistoryRequest::from_params(&params, &state.config.pagination)?;
    Ok(Json(project(&state, FetchScope::Box(box_id), request).await))
}

async fn project(state: &AppState, scope: FetchScope, request: HistoryRequest) -> Projection {
    let filters = FetchFilters::from_state(&request.filter, request.item_id);
    let mut view = TransactionView::new(request.filter, state.config.fetch.stale_policy);
    view.refresh(&state.aggregator, &scope, &filters).await;

    let projection = view.projection();
    log::debug!(
        target: "boxtrail::fetch",
        "{} -> {} matching record(s), page {}/{}",
        scope,
        projection.total_filtered_count,
        projection.current_page,
        projection.total_pages
    );
    projection
}

fn non_blank<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_number(params: &HashMap<String, String>, key: &str) -> Result<Option<usize>, ApiError> {
    non_blank(params, key)
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|_| ApiError::invalid_param(key, format!("Not a page number: {}", raw)))
        })
        .transpose()
}

fn parse_date(params: &HashMap<String, String>, key: &str) -> Result<Option<NaiveDate>, ApiError> {
    non_blank(params, key)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| ApiError::invalid_param(key, format!("{}: {}", raw, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, router_with, send};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn ids(body: &Value) -> Vec<String> {
        body["page_records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_request_defaults() {
        let request = HistoryRequest::from_params(&params(&[]), &PaginationConfig::default()).unwrap();
        assert_eq!(request.filter, FilterState::new(10));
        assert_eq!(request.item_id, None);
    }

    #[test]
    fn test_request_keeps_requested_page() {
        let request = HistoryRequest::from_params(
            &params(&[("kind", "OUT"), ("item", "bolt"), ("page", "3"), ("page_size", "25")]),
            &PaginationConfig::default(),
        )
        .unwrap();
        assert_eq!(request.filter.kind(), FilterKind::Out);
        assert_eq!(request.filter.item_query(), "bolt");
        assert_eq!(request.filter.page(), 3);
        assert_eq!(request.filter.page_size(), 25);
    }

    #[test]
    fn test_unlisted_page_size_falls_back_to_default() {
        let request =
            HistoryRequest::from_params(&params(&[("page_size", "7")]), &PaginationConfig::default())
                .unwrap();
        assert_eq!(request.filter.page_size(), 10);
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let pagination = PaginationConfig::default();
        for pairs in [
            [("kind", "sideways")],
            [("start_date", "2024-13-01")],
            [("end_date", "yesterday")],
            [("page_size", "0")],
            [("page", "-1")],
        ] {
            let err = HistoryRequest::from_params(&params(&pairs), &pagination).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{:?}", pairs);
        }
    }

    #[tokio::test]
    async fn test_global_history_newest_first() {
        let (router, _file) = router_with(&fixture()).await;
        let (status, body) = send(router, "GET", "/api/transactions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["t4", "t3", "t2", "t1"]);
        assert_eq!(body["total_filtered_count"], 4);
        assert_eq!(body["page_records"][2]["attribution_label"], "Consumed");
        assert_eq!(body["page_records"][0]["kind_label"], "SOFT DELETE");
    }

    #[tokio::test]
    async fn test_delete_kind_uses_deletion_fallback() {
        let (router, _file) = router_with(&fixture()).await;
        let (status, body) = send(router, "GET", "/api/transactions?kind=delete").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["t4"]);
        assert!(body.get("empty_state").is_none());
    }

    #[tokio::test]
    async fn test_box_history_applies_client_filters() {
        let (router, _file) = router_with(&fixture()).await;
        let (_, body) = send(router.clone(), "GET", "/api/boxes/B1/transactions").await;
        assert_eq!(ids(&body), vec!["t2", "t1"]);

        let (_, body) = send(router, "GET", "/api/boxes/B1/transactions?kind=out").await;
        assert_eq!(ids(&body), vec!["t2"]);
    }

    #[tokio::test]
    async fn test_date_range_and_paging() {
        let (router, _file) = router_with(&fixture()).await;
        let (_, body) = send(
            router,
            "GET",
            "/api/transactions?start_date=2024-05-02&end_date=2024-05-03&page_size=10&page=4",
        )
        .await;
        assert_eq!(ids(&body), vec!["t3", "t2"]);
        assert_eq!(body["current_page"], 1);
        assert_eq!(body["total_pages"], 1);
    }

    #[tokio::test]
    async fn test_global_and_box_views_agree_on_aliased_kinds() {
        let document = json!([
            { "id": "a1", "type": "new_item", "box_id": "B1", "created_at": "2024-06-01T08:00:00Z" },
            { "id": "a2", "type": "item_added", "box_id": "B1", "created_at": "2024-06-02T08:00:00Z" },
            { "id": "a3", "type": "remove", "box_id": "B1", "created_at": "2024-06-03T08:00:00Z" }
        ]);
        let (router, _file) = router_with(&document).await;

        for (kind, expected) in [("in", vec!["a2", "a1"]), ("out", vec!["a3"])] {
            let (_, global) = send(router.clone(), "GET", &format!("/api/transactions?kind={}", kind)).await;
            let (_, boxed) = send(
                router.clone(),
                "GET",
                &format!("/api/boxes/B1/transactions?kind={}", kind),
            )
            .await;
            assert_eq!(ids(&global), expected, "global kind={}", kind);
            assert_eq!(ids(&boxed), expected, "box kind={}", kind);
        }
    }

    #[tokio::test]
    async fn test_offset_timestamps_filtered_by_utc_day() {
        let document = json!([
            { "id": "o1", "type": "in", "created_at": "2024-01-31T23:30:00-05:00" }
        ]);
        let (router, _file) = router_with(&document).await;
        let (_, body) = send(router, "GET", "/api/transactions?start_date=2024-02-01").await;
        assert_eq!(ids(&body), vec!["o1"]);
    }

    #[tokio::test]
    async fn test_no_matches_empty_state() {
        let (router, _file) = router_with(&fixture()).await;
        let (status, body) = send(router, "GET", "/api/transactions?item=washer").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["empty_state"], "no_matching_records");
        assert_eq!(body["total_pages"], 1);
    }

    #[tokio::test]
    async fn test_malformed_document_reports_load_failure() {
        let (router, _file) = router_with(&json!({ "records": [] })).await;
        let (status, body) = send(router, "GET", "/api/transactions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["empty_state"], "load_failed");
        assert_eq!(body["total_filtered_count"], 0);
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let (router, _file) = router_with(&fixture()).await;
        let (status, body) = send(router, "GET", "/api/transactions?kind=sideways").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FILTER");
    }
}
