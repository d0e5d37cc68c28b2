//! Dashboard server binary.

use gmc_pipeline::PipelineConfig;
use tracing::{error, info, warn};

use gmc_server::{create_router, logging, metrics, AppState, ServerConfig, StatusPublisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    logging::init_tracing();

    info!("Starting gmc-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ServerConfig::from_env();
    info!(
        "Server config: host={}, port={}, camera={}",
        config.host, config.port, config.camera_device
    );

    let (state, mut publisher) = AppState::new(config.clone());

    let pipeline_config = match PipelineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid pipeline configuration, using defaults");
            publisher.fail(e.to_string());
            PipelineConfig::default()
        }
    };

    let capture = start_capture(&config, pipeline_config, publisher);

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stop_capture(capture).await;
    info!("Server shutdown complete");
    Ok(())
}

#[cfg(feature = "camera")]
type Capture = Option<gmc_server::capture_loop::CaptureHandle>;

#[cfg(not(feature = "camera"))]
type Capture = ();

#[cfg(feature = "camera")]
fn start_capture(config: &ServerConfig, pipeline: PipelineConfig, publisher: StatusPublisher) -> Capture {
    match gmc_server::capture_loop::spawn_capture_loop(config, pipeline, publisher) {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(error = %e, "Failed to spawn capture thread");
            None
        }
    }
}

#[cfg(not(feature = "camera"))]
fn start_capture(_config: &ServerConfig, _pipeline: PipelineConfig, mut publisher: StatusPublisher) -> Capture {
    warn!("Camera support not compiled in; serving status only");
    // The last snapshot outlives the publisher.
    publisher.fail("camera support not compiled in (enable the `camera` feature)");
}

#[cfg(feature = "camera")]
async fn stop_capture(capture: Capture) {
    if let Some(handle) = capture {
        if let Err(e) = tokio::task::spawn_blocking(move || handle.stop()).await {
            warn!(error = %e, "Capture shutdown task failed");
        }
    }
}

#[cfg(not(feature = "camera"))]
async fn stop_capture(_capture: Capture) {}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
