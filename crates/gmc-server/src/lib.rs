//! Gesture media control dashboard server.
//!
//! This crate provides:
//! - An MJPEG video feed with landmark and metrics overlay
//! - A JSON status endpoint with the latest gesture, FPS and latency
//! - Health/readiness probes and Prometheus metrics
//! - The camera capture loop driving the frame pipeline (`camera` feature)

pub mod config;
pub mod error;
pub mod frame_loop;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

#[cfg(feature = "camera")]
pub mod capture_loop;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, StatusPublisher};
