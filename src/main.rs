// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::render_sync::RenderSync;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::display_snapshot::SnapshotDisplay;
use crate::infrastructure::lmp_http_repository::LmpHttpRepository;
use crate::infrastructure::tokio_scheduler::TokioTickScheduler;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    display, health_check, load_data, pause, play, seek, set_price_type, set_reference_zone,
    set_speed, show_average, stream_display, zone_value,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config().context("Failed to load config/dashboard")?;
    let settings = config.playback_settings()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(LmpHttpRepository::new(
        config.backend.base_url.clone(),
        Duration::from_secs(config.backend.timeout_secs),
    )?);

    // Display consumers all share one snapshot
    let display_snapshot = SnapshotDisplay::new();
    let consumer = Arc::new(display_snapshot.clone());
    let render = RenderSync::new(
        consumer.clone(),
        consumer.clone(),
        consumer.clone(),
        consumer,
    );

    // Create services (application layer)
    let dashboard =
        DashboardService::spawn(repository, TokioTickScheduler::new, render, settings);

    if let Some(filter) = config.default_filter.clone() {
        tracing::info!("Loading default filter {} to {}", filter.start_day, filter.end_day);
        dashboard.load_data(filter).await?;
    }

    // Create application state
    let state = Arc::new(AppState {
        dashboard,
        display: display_snapshot,
    });

    // Build router (presentation layer)
    // Compression is handled in the response builders, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/filter", post(load_data))
        .route("/playback/play", post(play))
        .route("/playback/pause", post(pause))
        .route("/playback/average", post(show_average))
        .route("/playback/seek", post(seek))
        .route("/playback/speed", post(set_speed))
        .route("/view/price-type", put(set_price_type))
        .route("/view/reference-zone", put(set_reference_zone))
        .route("/display", get(display))
        .route("/display/stream", get(stream_display))
        .route("/zones/:zone", get(zone_value))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting lmp-dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
