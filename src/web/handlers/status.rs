//! Service status handler

use axum::{extract::State, response::Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::web::{AppState, responses::ok};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `ready` once the first update has completed, `initializing` before
    pub status: String,
    pub last_update: Option<DateTime<Utc>>,
    pub next_update: Option<DateTime<Utc>>,
    pub updating: bool,
    pub channels_count: usize,
    pub update_interval_minutes: u64,
    pub epg_hours: u64,
    pub uptime_seconds: i64,
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshots.get().await;
    let interval = state.config.updates.interval_delta();

    ok(StatusResponse {
        status: if snapshot.is_ready() { "ready" } else { "initializing" }.to_string(),
        last_update: snapshot.last_update,
        next_update: snapshot
            .last_update
            .and_then(|last| last.checked_add_signed(interval)),
        updating: state.updates.is_updating(),
        channels_count: snapshot.channel_count(),
        update_interval_minutes: state.config.updates.interval_minutes,
        epg_hours: state.config.updates.epg_hours,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}
