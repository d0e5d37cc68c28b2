//! Per-frame metrics and the read-only status view handed to reporters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Gesture;

/// Metrics for the most recently processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrameMetrics {
    /// Time spent between frame start and classification, truncated to ms.
    pub latency_ms: u64,
    /// Frames per second derived from consecutive frame starts (0 when unknown).
    pub fps: f64,
    /// Gesture classified for this frame.
    pub gesture: Gesture,
}

impl FrameMetrics {
    /// One-line dashboard text, e.g. `FPS: 30 | Latency: 12ms | Gesture: MUTE`.
    pub fn overlay_text(&self) -> String {
        format!(
            "FPS: {} | Latency: {}ms | Gesture: {}",
            self.fps as u32, self.latency_ms, self.gesture
        )
    }
}

/// Status payload served to external reporters.
///
/// Serialized as `{"gesture": "...", "fps": 0, "latency": 0, "error": null}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct StatusSnapshot {
    pub gesture: Gesture,
    pub fps: u32,
    /// Latency in milliseconds.
    pub latency: u64,
    /// Initialization failure of an external collaborator, if any.
    pub error: Option<String>,
}

impl StatusSnapshot {
    /// Snapshot for a frame, keeping any collaborator error already reported.
    pub fn from_metrics(metrics: &FrameMetrics, error: Option<String>) -> Self {
        Self {
            gesture: metrics.gesture,
            fps: metrics.fps.max(0.0) as u32,
            latency: metrics.latency_ms,
            error,
        }
    }

    /// Snapshot reporting a collaborator failure with no frame data.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
