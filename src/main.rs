use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pluto_iptv_proxy::{
    config::Config,
    services::{SnapshotStore, UpdateScheduler, UpdateService},
    sources::PlutoCatalogFetcher,
    web::{AppState, WebServer},
};

#[derive(Parser)]
#[command(name = "pluto-iptv-proxy")]
#[command(version)]
#[command(about = "Republishes a remote channel catalog as an M3U8 playlist and an XMLTV guide")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level (overrides config; RUST_LOG overrides both)
    #[arg(short = 'v', long)]
    log_level: Option<String>,
}

fn init_logging(level: &str, json: bool) {
    let log_filter = if level == "trace" {
        format!("pluto_iptv_proxy={level},tower_http=trace")
    } else {
        format!("pluto_iptv_proxy={level},tower_http=warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Cancel `token` on SIGINT or SIGTERM
async fn wait_for_shutdown(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutting down gracefully");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Received Ctrl+C, shutting down gracefully");
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging.level, config.logging.json);
    info!("Starting Pluto IPTV Proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", cli.config);
    info!(
        "Catalog: {} (update every {}m, guide window {}h)",
        config.source.api_url, config.updates.interval_minutes, config.updates.epg_hours
    );

    let snapshots = SnapshotStore::new();
    let fetcher = PlutoCatalogFetcher::from_config(&config)?;
    let update_service = Arc::new(UpdateService::new(
        Arc::new(fetcher),
        snapshots.clone(),
        &config,
    ));

    let shutdown = CancellationToken::new();
    let (scheduler, update_handle) = UpdateScheduler::new(
        update_service,
        config.updates.interval(),
        config.updates.run_on_startup,
        shutdown.child_token(),
    );

    let web_server = WebServer::new(AppState::new(
        Arc::new(config),
        snapshots,
        update_handle,
    ));
    info!("Starting web server on {}", web_server.bind_address());

    // Create a channel to signal when the server is ready or fails to bind
    let (server_ready_tx, server_ready_rx) = tokio::sync::oneshot::channel();
    let server_token = shutdown.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = web_server
            .serve_with_cancellation(server_ready_tx, server_token)
            .await
        {
            error!("Web server failed: {}", e);
        }
    });

    match server_ready_rx.await {
        Ok(Ok(addr)) => {
            info!("Web server listening on http://{}", addr);
            info!("Playlist: http://{}/playlist.m3u8", addr);
            info!("Guide: http://{}/epg.xml", addr);
        }
        Ok(Err(bind_error)) => {
            error!("Failed to bind web server: {}", bind_error);
            return Err(bind_error);
        }
        Err(_) => {
            error!("Web server task completed without signaling");
            return Err(anyhow::anyhow!("Web server failed to start"));
        }
    }

    // Background updates only start once the listener is up
    info!("Starting update scheduler");
    let scheduler_handle = tokio::spawn(scheduler.run());
    tokio::spawn(wait_for_shutdown(shutdown.clone()));

    server_handle.await?;
    shutdown.cancel();
    if let Err(e) = scheduler_handle.await {
        error!("Update scheduler terminated abnormally: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
