//! HTTP response types and helpers
//!
//! The two published documents are plain text bodies with a fixed content
//! type; everything else is JSON.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const GUIDE_CONTENT_TYPE: &str = "application/xml";
pub const INITIALIZING_MESSAGE: &str = "Service initializing, please wait...";

/// JSON body for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Machine readable error kind
    pub error: String,
    /// Human readable description
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Convert AppError to an HTTP response
pub fn handle_error(error: AppError) -> Response {
    let kind = match &error {
        AppError::FetchFailed(_) => "fetch_failed",
        AppError::UpdateTimedOut(_) => "update_timed_out",
        AppError::Configuration { .. } => "configuration_error",
        AppError::Internal { .. } => "internal_error",
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(kind, error.to_string())),
    )
        .into_response()
}

/// Success response helper
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Returned when an update is already running
pub fn too_many_requests(message: &str) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse::new("update_in_progress", message)),
    )
        .into_response()
}

/// Returned for the documents until the first update completes
pub fn service_initializing() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, HeaderValue::from_static("10"))],
        INITIALIZING_MESSAGE,
    )
        .into_response()
}

/// Serve a generated document inline under `filename`
pub fn document(content_type: &'static str, filename: &str, body: String) -> Response {
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
