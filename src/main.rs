// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::{mpsc, watch};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::charts::ChartStyle;
use crate::application::data_source::SequenceSource;
use crate::application::live_session::{start_live_session, SessionSettings};
use crate::application::performance_sampler::spawn_sampler;
use crate::domain::generation::{GenerationRequest, GenerationSpec};
use crate::domain::viewport::Viewport;
use crate::infrastructure::canvas::RecordingCanvas;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::generator::SyntheticGenerator;
use crate::infrastructure::memory_probe::ProcMemoryProbe;
use crate::infrastructure::worker::connect_worker;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{generate_data, health_check, performance, performance_stream, render_chart};

/// Frame readings buffered between the render loop and the sampler.
const FRAME_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Background worker behind the data source adapter
    let source: Arc<dyn SequenceSource> = Arc::new(connect_worker(SyntheticGenerator::new())?);

    // Performance sampler, fed by the live chart's frames
    let (frames_tx, frames_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
    let (points_tx, points_rx) = watch::channel(0usize);
    let sampler = spawn_sampler(
        Duration::from_millis(config.sampler.interval_ms.max(1)),
        config.sampler.history_size,
        frames_rx,
        points_rx,
        Arc::new(ProcMemoryProbe::default()),
    );

    let live = if config.live.enabled {
        let mut request = GenerationRequest::new(config.live.chart_type, config.live.count);
        request.time_range = config.live.time_range;
        let viewport = Viewport::measure(
            Some(config.render.canvas_width),
            Some(config.render.canvas_height),
            Some(config.render.device_pixel_ratio),
        );
        let settings = SessionSettings {
            kind: config.live.chart_type,
            spec: GenerationSpec::from(&request),
            viewport,
            style: ChartStyle {
                cell_size: config.render.cell_size,
                ..ChartStyle::default()
            },
            refresh: config.render.refresh_interval(),
            auto_refresh: Duration::from_millis(config.live.auto_refresh_ms.max(1)),
        };
        tracing::info!(chart = %config.live.chart_type, count = config.live.count, "starting live session");
        Some(start_live_session(
            source.clone(),
            RecordingCanvas::new(),
            settings,
            frames_tx,
            points_tx,
        ))
    } else {
        None
    };

    // Create application state
    let state = Arc::new(AppState {
        source,
        reports: sampler.subscribe(),
        render: config.render.clone(),
    });

    // Build router (presentation layer)
    // Compression is negotiated per response, so no CompressionLayer here.
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/data", post(generate_data))
        .route("/api/render", post(render_chart))
        .route("/api/performance", get(performance))
        .route("/api/performance/stream", get(performance_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(%addr, "starting chart-telemetry service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    if let Some(live) = live {
        let chart = live.shutdown().await?;
        tracing::info!(
            drawn = chart.scheduler().frames_drawn(),
            dropped = chart.scheduler().frames_dropped(),
            last_error = chart.error().unwrap_or("none"),
            "live session stopped"
        );
    }
    drop(sampler);

    Ok(())
}
