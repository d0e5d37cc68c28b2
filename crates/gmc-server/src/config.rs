//! Server configuration.

use std::time::Duration;

use crate::frame_loop::ReadRetry;

/// Dashboard server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Capture device index
    pub camera_device: i32,
    /// Requested capture width
    pub camera_width: u32,
    /// Requested capture height
    pub camera_height: u32,
    /// JPEG quality for the MJPEG stream (0-100)
    pub jpeg_quality: u8,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Frames buffered per MJPEG viewer before it starts skipping
    pub stream_buffer: usize,
    /// Delay between failed camera reads
    pub camera_retry_ms: u64,
    /// How long reads may keep failing before the camera is given up on
    pub camera_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            camera_device: 0,
            camera_width: 640,
            camera_height: 480,
            jpeg_quality: 70,
            metrics_enabled: true,
            stream_buffer: 4,
            camera_retry_ms: 50,
            camera_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source. Unparsable values
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("GMC_HOST").unwrap_or(defaults.host),
            port: lookup("GMC_PORT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            camera_device: lookup("GMC_CAMERA_DEVICE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.camera_device),
            camera_width: lookup("GMC_CAMERA_WIDTH")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.camera_width),
            camera_height: lookup("GMC_CAMERA_HEIGHT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.camera_height),
            jpeg_quality: lookup("GMC_JPEG_QUALITY")
                .and_then(|s| s.trim().parse::<u8>().ok())
                .map(|q| q.min(100))
                .unwrap_or(defaults.jpeg_quality),
            metrics_enabled: lookup("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            stream_buffer: lookup("GMC_STREAM_BUFFER")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.stream_buffer),
            camera_retry_ms: lookup("GMC_CAMERA_RETRY_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.camera_retry_ms),
            camera_timeout_ms: lookup("GMC_CAMERA_TIMEOUT_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.camera_timeout_ms),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Retry policy for failed camera reads.
    pub fn read_retry(&self) -> ReadRetry {
        ReadRetry::new(
            Duration::from_millis(self.camera_retry_ms),
            Duration::from_millis(self.camera_timeout_ms),
        )
    }
}
