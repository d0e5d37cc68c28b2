//! Camera-independent pieces of the capture loop: read retry with backoff
//! and the inference skip policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use gmc_models::Landmark;
use gmc_pipeline::{LandmarkSource, PipelineResult};
use tracing::{debug, warn};

use crate::metrics;

/// What to do after a failed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep this long, then read again.
    Retry(Duration),
    /// The device has produced nothing for too long.
    GiveUp,
}

/// Backoff between failed camera reads.
///
/// Failures are retried every `retry_delay`; the device is given up on once
/// reads have failed without interruption for longer than `give_up_after`.
#[derive(Debug, Clone)]
pub struct ReadRetry {
    retry_delay: Duration,
    give_up_after: Duration,
    failing_since: Option<Instant>,
}

impl ReadRetry {
    pub fn new(retry_delay: Duration, give_up_after: Duration) -> Self {
        Self {
            retry_delay,
            give_up_after,
            failing_since: None,
        }
    }

    pub fn on_success(&mut self) {
        self.failing_since = None;
    }

    pub fn on_failure(&mut self, now: Instant) -> RetryDecision {
        let since = *self.failing_since.get_or_insert(now);
        if now.saturating_duration_since(since) > self.give_up_after {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry(self.retry_delay)
        }
    }

    pub fn is_failing(&self) -> bool {
        self.failing_since.is_some()
    }
}

/// Read until a frame arrives.
///
/// Returns `None` when the retry budget is exhausted or `shutdown` is set.
pub fn next_frame<T, R>(mut read: R, retry: &mut ReadRetry, shutdown: &AtomicBool) -> Option<T>
where
    R: FnMut() -> PipelineResult<Option<T>>,
{
    while !shutdown.load(Ordering::Relaxed) {
        match read() {
            Ok(Some(frame)) => {
                retry.on_success();
                return Some(frame);
            }
            Ok(None) => debug!("Camera returned no frame"),
            Err(e) => {
                metrics::record_capture_error("read");
                debug!(error = %e, "Frame read failed");
            }
        }

        match retry.on_failure(Instant::now()) {
            RetryDecision::Retry(delay) => std::thread::sleep(delay),
            RetryDecision::GiveUp => return None,
        }
    }
    None
}

/// Run landmark detection for one frame.
///
/// `Some(landmarks)` is the result to step (`Some(None)` when there is no
/// landmarker or no hand). `None` means inference failed and the frame is
/// skipped instead of being reported as NONE.
pub fn detect_or_skip<S>(source: Option<&mut S>, frame: &S::Frame) -> Option<Option<Vec<Landmark>>>
where
    S: LandmarkSource + ?Sized,
{
    let Some(source) = source else {
        return Some(None);
    };
    match source.detect(frame) {
        Ok(landmarks) => Some(landmarks),
        Err(e) => {
            metrics::record_capture_error("inference");
            warn!(source = source.name(), error = %e, "Landmark detection failed, skipping frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmc_pipeline::classifier::fixtures::fist;
    use gmc_pipeline::PipelineError;

    fn retry() -> ReadRetry {
        ReadRetry::new(Duration::from_millis(1), Duration::from_millis(200))
    }

    #[test]
    fn test_burst_of_failures_keeps_retrying() {
        let mut r = retry();
        let t0 = Instant::now();
        for _ in 0..1000 {
            assert_eq!(r.on_failure(t0), RetryDecision::Retry(Duration::from_millis(1)));
        }
        assert_eq!(
            r.on_failure(t0 + Duration::from_millis(200)),
            RetryDecision::Retry(Duration::from_millis(1))
        );
        assert_eq!(r.on_failure(t0 + Duration::from_millis(201)), RetryDecision::GiveUp);
    }

    #[test]
    fn test_success_resets_failure_window() {
        let mut r = retry();
        let t0 = Instant::now();
        r.on_failure(t0);
        r.on_success();
        assert!(!r.is_failing());
        assert!(matches!(
            r.on_failure(t0 + Duration::from_secs(10)),
            RetryDecision::Retry(_)
        ));
    }

    #[test]
    fn test_warming_up_camera_recovers() {
        let mut reads = 0;
        let stub = || {
            reads += 1;
            match reads {
                1..=40 => Ok(None),
                41..=45 => Err(PipelineError::capture("device busy")),
                _ => Ok(Some(reads)),
            }
        };

        let shutdown = AtomicBool::new(false);
        let mut r = ReadRetry::new(Duration::from_micros(100), Duration::from_secs(5));
        assert_eq!(next_frame(stub, &mut r, &shutdown), Some(46));
        assert!(!r.is_failing());
    }

    #[test]
    fn test_dead_camera_gives_up_after_window() {
        let shutdown = AtomicBool::new(false);
        let mut r = ReadRetry::new(Duration::from_millis(5), Duration::from_millis(30));
        let start = Instant::now();
        let frame: Option<u32> = next_frame(|| Ok(None), &mut r, &shutdown);
        assert!(frame.is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_shutdown_stops_reading() {
        let shutdown = AtomicBool::new(true);
        let mut r = retry();
        let frame: Option<u32> = next_frame(|| Ok(Some(1)), &mut r, &shutdown);
        assert!(frame.is_none());
    }

    struct StubSource {
        result: Option<PipelineResult<Option<Vec<Landmark>>>>,
    }

    impl LandmarkSource for StubSource {
        type Frame = ();

        fn detect(&mut self, _frame: &()) -> PipelineResult<Option<Vec<Landmark>>> {
            self.result.take().unwrap_or(Ok(None))
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    #[test]
    fn test_inference_failure_skips_frame() {
        let mut source = StubSource {
            result: Some(Err(PipelineError::inference("ORT run failed"))),
        };
        assert_eq!(detect_or_skip(Some(&mut source), &()), None);
    }

    #[test]
    fn test_detection_results_pass_through() {
        let mut source = StubSource {
            result: Some(Ok(Some(fist()))),
        };
        assert_eq!(detect_or_skip(Some(&mut source), &()), Some(Some(fist())));
        assert_eq!(detect_or_skip(Some(&mut source), &()), Some(None));
        assert_eq!(detect_or_skip::<StubSource>(None, &()), Some(None));
    }
}
