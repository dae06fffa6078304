//! Web utility functions

use axum::http::{Method, Uri};
use tracing::{debug, info};

use super::extractors::RequestContext;

/// Log an incoming HTTP request that changes state
pub fn log_request(method: &Method, uri: &Uri, context: &RequestContext) {
    info!(
        method = %method,
        uri = %uri,
        request_id = %context.request_id,
        user_agent = ?context.user_agent,
        real_ip = ?context.real_ip,
        "HTTP request"
    );
}

/// Log a document fetch; players poll these often, so keep it at debug
pub fn log_document_request(document: &str, context: &RequestContext) {
    debug!(
        document = document,
        request_id = %context.request_id,
        user_agent = ?context.user_agent,
        real_ip = ?context.real_ip,
        "Serving document"
    );
}
