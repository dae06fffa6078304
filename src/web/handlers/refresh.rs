//! Manual refresh handler

use axum::{
    extract::State,
    http::{Method, Uri},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::UpdateOutcome;
use crate::web::{
    AppState,
    extractors::RequestContext,
    responses::{handle_error, ok, too_many_requests},
    utils::log_request,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub last_update: DateTime<Utc>,
    pub channels_count: usize,
}

/// `POST /refresh`
///
/// Waits for the update to finish. 429 when one is already running.
pub async fn refresh(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    context: RequestContext,
) -> Response {
    log_request(&method, &uri, &context);

    match state.updates.request_refresh().await {
        UpdateOutcome::Completed(summary) => ok(RefreshResponse {
            success: true,
            message: "Data updated successfully".to_string(),
            last_update: summary.last_update,
            channels_count: summary.channel_count,
        }),
        UpdateOutcome::Busy => too_many_requests("Update already in progress"),
        UpdateOutcome::Failed(e) => handle_error(e),
    }
}
