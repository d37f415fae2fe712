// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::application::channels::ChannelHub;
use crate::application::feed::spawn_feed;
use crate::application::sensor_service::SensorService;
use crate::application::status_service::StatusService;
use crate::domain::threshold::ThresholdTable;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::mock_store::MockTelemetryStore;
use crate::infrastructure::theme_store::ThemeStore;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;
    let thresholds = Arc::new(ThresholdTable::builtin().with_overrides(config.thresholds.clone())?);
    tracing::info!(metrics = thresholds.len(), "threshold table loaded");

    // Telemetry source (infrastructure layer)
    let store = Arc::new(MockTelemetryStore::demo(chrono::Utc::now()));
    let hub = Arc::new(ChannelHub::new(config.feed.channel_capacity));
    let theme = Arc::new(ThemeStore::load(&config.theme.store_path).await?);

    // Create services (application layer)
    let sensor_service = SensorService::new(store.clone(), thresholds.clone());
    let status_service = StatusService::new(store.clone(), thresholds);

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState {
        sensor_service,
        status_service,
        hub: hub.clone(),
        theme,
        shutdown: shutdown.clone(),
    });

    let feed = if config.feed.enabled {
        Some(spawn_feed(store, hub, config.feed.interval(), config.feed.seed))
    } else {
        tracing::info!("telemetry feed disabled");
        None
    };

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "starting tbm-telemetry service");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    if let Some(feed) = feed {
        feed.shutdown().await;
    }
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    shutdown.cancel();
}
