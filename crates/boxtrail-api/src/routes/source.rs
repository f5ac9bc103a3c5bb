//! Health and reload endpoints

use crate::{ApiError, AppState};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub records: usize,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Re-read the transaction file
pub async fn api_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    match state.source.reload().await {
        Ok(records) => Ok(Json(ReloadResponse {
            success: true,
            records,
        })),
        Err(e) => {
            log::warn!(
                target: "boxtrail::source",
                "Reload of {} failed: {}",
                state.source.path().display(),
                e
            );
            Err(ApiError::ReloadFailed {
                message: e.to_string(),
            })
        }
    }
}
