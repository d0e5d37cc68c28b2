//! Pipeline metrics, recorded through the `metrics` facade.
//!
//! Without an installed recorder these calls are no-ops.

use gmc_models::{Gesture, MediaAction};
use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_TOTAL: &str = "gmc_frames_total";
    pub const FRAME_LATENCY_SECONDS: &str = "gmc_frame_latency_seconds";
    pub const GESTURES_FIRED_TOTAL: &str = "gmc_gestures_fired_total";
    pub const GESTURES_SUPPRESSED_TOTAL: &str = "gmc_gestures_suppressed_total";
    pub const DISPATCH_FAILURES_TOTAL: &str = "gmc_dispatch_failures_total";
    pub const CONTRACT_VIOLATIONS_TOTAL: &str = "gmc_contract_violations_total";
}

/// Record a processed frame and its latency.
pub fn record_frame(latency_ms: u64) {
    counter!(names::FRAMES_TOTAL).increment(1);
    histogram!(names::FRAME_LATENCY_SECONDS).record(latency_ms as f64 / 1000.0);
}

/// Record an accepted fire.
pub fn record_gesture_fired(gesture: Gesture) {
    let labels = [("gesture", gesture.as_str().to_string())];
    counter!(names::GESTURES_FIRED_TOTAL, &labels).increment(1);
}

/// Record a gesture held back by the cooldown.
pub fn record_gesture_suppressed(gesture: Gesture) {
    let labels = [("gesture", gesture.as_str().to_string())];
    counter!(names::GESTURES_SUPPRESSED_TOTAL, &labels).increment(1);
}

/// Record a failed key press.
pub fn record_dispatch_failure(action: MediaAction) {
    let labels = [("action", action.as_str().to_string())];
    counter!(names::DISPATCH_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a malformed landmark set.
pub fn record_contract_violation() {
    counter!(names::CONTRACT_VIOLATIONS_TOTAL).increment(1);
}
