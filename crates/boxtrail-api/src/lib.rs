//! JSON HTTP API over the transaction history engine
//!
//! Routes are organized into modules:
//! - routes::transactions: global and per-box history views
//! - routes::source: health check and source reload

pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use boxtrail_config::Config;
use boxtrail_core::FetchAggregator;
use boxtrail_source::JsonFileSource;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<FetchAggregator>,
    pub source: Arc<JsonFileSource>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, source: Arc<JsonFileSource>) -> Self {
        let aggregator = Arc::new(FetchAggregator::new(source.clone()));
        Self {
            aggregator,
            source,
            config,
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::source::{api_reload, health_check};
    use routes::transactions::{api_box_transactions, api_transactions};

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/transactions", get(api_transactions))
        .route("/api/boxes/:box_id/transactions", get(api_box_transactions))
        .route("/api/reload", post(api_reload))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn start_server(config: Config, source: Arc<JsonFileSource>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(AppState::new(config, source));

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting boxtrail server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - GET  /api/transactions");
    log::info!("  - GET  /api/boxes/:box_id/transactions");
    log::info!("  - POST /api/reload");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::io::Write;
    use tower::ServiceExt;

    pub fn fixture() -> Value {
        json!([
            { "id": "t1", "type": "in", "item_id": "100", "item_name": "Hex Bolt M8", "box_id": "B1", "created_at": "2024-05-01T08:00:00Z" },
            { "id": "t2", "type": "STOCK_OUT", "item_id": "100", "item_name": "Hex Bolt M8", "box_id": "B1", "reason_code": "1", "created_at": "2024-05-02T08:00:00Z" },
            { "id": "t3", "type": "transfer", "item_id": "200", "item_name": "Cable Tie", "box_id": "B2", "created_at": "2024-05-03T08:00:00Z" },
            { "id": "t4", "type": "soft_delete", "item_id": "200", "item_name": "Cable Tie", "box_id": "B2", "is_deletion": true, "created_at": "2024-05-04T08:00:00Z" }
        ])
    }

    pub fn write_document(document: &Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", document).unwrap();
        file
    }

    /// Router over a loaded file source; keep the file alive for the test
    pub async fn router_with(document: &Value) -> (Router, tempfile::NamedTempFile) {
        let file = write_document(document);
        let source = JsonFileSource::open(file.path().to_path_buf()).await.unwrap();
        let state = AppState::new(Config::default(), Arc::new(source));
        (create_router(state), file)
    }

    pub async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        });
        (status, body)
    }
}
