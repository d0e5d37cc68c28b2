//! Prometheus metrics for the dashboard server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "gmc_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "gmc_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "gmc_http_requests_in_flight";

    // MJPEG stream metrics
    pub const STREAM_CONNECTIONS_TOTAL: &str = "gmc_stream_connections_total";
    pub const STREAM_VIEWERS_ACTIVE: &str = "gmc_stream_viewers_active";
    pub const STREAM_FRAMES_SKIPPED_TOTAL: &str = "gmc_stream_frames_skipped_total";

    // Capture loop metrics
    pub const CAPTURE_ERRORS_TOTAL: &str = "gmc_capture_errors_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a new MJPEG viewer.
pub fn record_stream_connected() {
    counter!(names::STREAM_CONNECTIONS_TOTAL).increment(1);
    gauge!(names::STREAM_VIEWERS_ACTIVE).increment(1.0);
}

/// Record an MJPEG viewer going away.
pub fn record_stream_disconnected() {
    gauge!(names::STREAM_VIEWERS_ACTIVE).decrement(1.0);
}

/// Record frames a lagging viewer skipped.
pub fn record_stream_frames_skipped(count: u64) {
    counter!(names::STREAM_FRAMES_SKIPPED_TOTAL).increment(count);
}

/// Record a per-frame capture or inference failure.
pub fn record_capture_error(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::CAPTURE_ERRORS_TOTAL, &labels).increment(1);
}

/// Collapse unknown paths so probes can't blow up label cardinality.
fn sanitize_path(path: &str) -> String {
    const KNOWN: &[&str] = &["/", "/video_feed", "/snapshot.jpg", "/status", "/health", "/healthz", "/ready", "/metrics"];
    if KNOWN.contains(&path) {
        path.to_string()
    } else {
        "other".to_string()
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
