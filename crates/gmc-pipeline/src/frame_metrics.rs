//! Per-frame latency and FPS.

use std::time::Instant;

use gmc_models::{FrameMetrics, Gesture};

/// Compute metrics for one frame.
///
/// Latency is truncated to whole milliseconds and saturates at zero when
/// `frame_end` precedes `frame_start`. FPS is the reciprocal of the gap
/// between consecutive frame starts, or 0 when there is no usable gap.
pub fn compute_frame_metrics(
    frame_start: Instant,
    frame_end: Instant,
    previous_frame_start: Option<Instant>,
    gesture: Gesture,
) -> FrameMetrics {
    let latency_ms = frame_end.saturating_duration_since(frame_start).as_millis() as u64;

    let fps = previous_frame_start
        .and_then(|prev| frame_start.checked_duration_since(prev))
        .map(|delta| delta.as_secs_f64())
        .filter(|secs| *secs > 0.0)
        .map(|secs| 1.0 / secs)
        .unwrap_or(0.0);

    FrameMetrics {
        latency_ms,
        fps,
        gesture,
    }
}

/// How the reported FPS is derived from instantaneous samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FpsSmoothing {
    /// Report each frame's instantaneous value.
    #[default]
    Instantaneous,
    /// Exponential moving average; `alpha` is the weight of the new sample.
    Ema { alpha: f64 },
}

impl FpsSmoothing {
    /// EMA weighting. `alpha` outside `(0, 1)` falls back to instantaneous.
    pub fn ema(alpha: f64) -> Self {
        if alpha.is_finite() && alpha > 0.0 && alpha < 1.0 {
            FpsSmoothing::Ema { alpha }
        } else {
            FpsSmoothing::Instantaneous
        }
    }
}

/// Keeps the previous frame start (and smoothed FPS) across frames.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    smoothing: FpsSmoothing,
    previous_frame_start: Option<Instant>,
    smoothed_fps: Option<f64>,
}

impl MetricsAggregator {
    pub fn new(smoothing: FpsSmoothing) -> Self {
        Self {
            smoothing,
            ..Self::default()
        }
    }

    pub fn previous_frame_start(&self) -> Option<Instant> {
        self.previous_frame_start
    }

    /// Record a frame and return its metrics.
    pub fn record(&mut self, frame_start: Instant, frame_end: Instant, gesture: Gesture) -> FrameMetrics {
        let mut metrics =
            compute_frame_metrics(frame_start, frame_end, self.previous_frame_start, gesture);
        self.previous_frame_start = Some(frame_start);

        if let FpsSmoothing::Ema { alpha } = self.smoothing {
            // Frames with no usable delta don't drag the average to zero.
            if metrics.fps > 0.0 {
                let next = match self.smoothed_fps {
                    Some(prev) => alpha * metrics.fps + (1.0 - alpha) * prev,
                    None => metrics.fps,
                };
                self.smoothed_fps = Some(next);
            }
            metrics.fps = self.smoothed_fps.unwrap_or(0.0);
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_latency_in_ms() {
        let t0 = Instant::now();
        let m = compute_frame_metrics(t0, t0 + ms(20), None, Gesture::None);
        assert_eq!(m.latency_ms, 20);
        assert_eq!(m.fps, 0.0);
    }

    #[test]
    fn test_latency_truncates() {
        let t0 = Instant::now();
        let m = compute_frame_metrics(t0, t0 + Duration::from_micros(20_999), None, Gesture::None);
        assert_eq!(m.latency_ms, 20);
    }

    #[test]
    fn test_end_before_start_saturates() {
        let t0 = Instant::now() + ms(100);
        let m = compute_frame_metrics(t0, t0 - ms(5), None, Gesture::Mute);
        assert_eq!(m.latency_ms, 0);
        assert_eq!(m.gesture, Gesture::Mute);
    }

    #[test]
    fn test_fps_from_previous_start() {
        let t0 = Instant::now();
        let m = compute_frame_metrics(t0 + ms(40), t0 + ms(45), Some(t0), Gesture::None);
        assert!((m.fps - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_or_negative_delta_gives_zero_fps() {
        let t0 = Instant::now() + ms(100);
        assert_eq!(compute_frame_metrics(t0, t0, Some(t0), Gesture::None).fps, 0.0);
        assert_eq!(compute_frame_metrics(t0, t0, Some(t0 + ms(10)), Gesture::None).fps, 0.0);
    }

    #[test]
    fn test_aggregator_tracks_previous_start() {
        let mut agg = MetricsAggregator::default();
        let t0 = Instant::now();
        assert_eq!(agg.record(t0, t0, Gesture::None).fps, 0.0);
        let m = agg.record(t0 + ms(50), t0 + ms(50), Gesture::None);
        assert!((m.fps - 20.0).abs() < 1e-9);
        assert_eq!(agg.previous_frame_start(), Some(t0 + ms(50)));
    }

    #[test]
    fn test_ema_smoothing() {
        let mut agg = MetricsAggregator::new(FpsSmoothing::ema(0.5));
        let t0 = Instant::now();
        agg.record(t0, t0, Gesture::None);
        let first = agg.record(t0 + ms(50), t0 + ms(50), Gesture::None).fps;
        assert!((first - 20.0).abs() < 1e-9);
        // Next gap is 25ms (40 fps): average of 20 and 40.
        let second = agg.record(t0 + ms(75), t0 + ms(75), Gesture::None).fps;
        assert!((second - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_alpha_falls_back() {
        assert_eq!(FpsSmoothing::ema(0.0), FpsSmoothing::Instantaneous);
        assert_eq!(FpsSmoothing::ema(1.0), FpsSmoothing::Instantaneous);
        assert_eq!(FpsSmoothing::ema(f64::NAN), FpsSmoothing::Instantaneous);
    }
}
