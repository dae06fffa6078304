//! Published document handlers
//!
//! Both read the current snapshot and never wait on an update.

use axum::{extract::State, response::Response};

use crate::services::backup::{GUIDE_BACKUP_FILE, PLAYLIST_BACKUP_FILE};
use crate::web::{
    AppState,
    extractors::RequestContext,
    responses::{GUIDE_CONTENT_TYPE, PLAYLIST_CONTENT_TYPE, document, service_initializing},
    utils::log_document_request,
};

/// `GET /playlist.m3u8`
pub async fn playlist(State(state): State<AppState>, context: RequestContext) -> Response {
    log_document_request("playlist", &context);

    let snapshot = state.snapshots.get().await;
    if !snapshot.is_ready() {
        return service_initializing();
    }
    document(
        PLAYLIST_CONTENT_TYPE,
        PLAYLIST_BACKUP_FILE,
        snapshot.playlist.clone(),
    )
}

/// `GET /epg.xml`
pub async fn guide(State(state): State<AppState>, context: RequestContext) -> Response {
    log_document_request("guide", &context);

    let snapshot = state.snapshots.get().await;
    if !snapshot.is_ready() {
        return service_initializing();
    }
    document(GUIDE_CONTENT_TYPE, GUIDE_BACKUP_FILE, snapshot.guide.clone())
}
