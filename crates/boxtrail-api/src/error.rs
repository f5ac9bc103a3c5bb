//! Error types for boxtrail-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use boxtrail_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(CoreError),

    #[error("Reload failed: {message}")]
    ReloadFailed { message: String },
}

impl ApiError {
    /// Bad query parameter
    pub fn invalid_param(field: &str, message: impl Into<String>) -> Self {
        ApiError::BadRequest(CoreError::InvalidFilter {
            field: field.to_string(),
            message: message.into(),
        })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ReloadFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::BadRequest(err) => err.to_details(),
            ApiError::ReloadFailed { message } => CoreError::SourceUnavailable {
                query: "reload".to_string(),
                message: message.clone(),
            }
            .to_details(),
        };
        (self.status(), Json(details)).into_response()
    }
}
