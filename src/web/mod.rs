//! Web layer module
//!
//! Serves the published playlist and guide, a status endpoint, a manual
//! refresh trigger and an embedded landing page.
//!
//! - **Handlers**: thin request handlers that read the snapshot or talk to the scheduler
//! - **Responses**: document and JSON response helpers, error mapping
//! - **Extractors**: request metadata for logging
//! - **Utils**: logging helpers

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    services::{SnapshotStore, UpdateHandle},
};

pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod utils;

pub use extractors::RequestContext;
pub use responses::{ErrorResponse, handle_error};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub snapshots: SnapshotStore,
    pub updates: UpdateHandle,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Arc<Config>, snapshots: SnapshotStore, updates: UpdateHandle) -> Self {
        Self {
            config,
            snapshots,
            updates,
            started_at: Utc::now(),
        }
    }
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    bind_address: String,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        let bind_address = format!("{}:{}", state.config.web.host, state.config.web.port);
        Self {
            app: Self::create_router(state),
            bind_address,
        }
    }

    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::index::index))
            .route("/playlist.m3u8", get(handlers::content::playlist))
            .route("/epg.xml", get(handlers::content::guide))
            .route("/status", get(handlers::status::status))
            .route("/refresh", post(handlers::refresh::refresh))
            .route(
                "/static/{*path}",
                get(handlers::static_assets::serve_static_asset),
            )
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Bind, report the bound address through `ready_signal`, then serve
    /// until `cancellation_token` fires
    pub async fn serve_with_cancellation(
        self,
        ready_signal: oneshot::Sender<Result<SocketAddr>>,
        cancellation_token: CancellationToken,
    ) -> Result<()> {
        let listener = match tokio::net::TcpListener::bind(&self.bind_address).await {
            Ok(listener) => listener,
            Err(bind_error) => {
                let message = format!("Failed to bind to {}: {}", self.bind_address, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", message)));
                return Err(anyhow::anyhow!("{}", message));
            }
        };

        let local_addr = listener.local_addr()?;
        let _ = ready_signal.send(Ok(local_addr));

        let shutdown_signal = async move {
            cancellation_token.cancelled().await;
            info!("Web server received cancellation signal, shutting down gracefully");
        };

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;
        Ok(())
    }
}
