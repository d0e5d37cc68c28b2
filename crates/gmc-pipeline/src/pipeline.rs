//! Frame pipeline orchestrator.
//!
//! [`FramePipeline::step`] runs classification, gating, dispatch and metrics
//! for one frame. It owns every piece of cross-frame state and is driven
//! synchronously by the embedding loop; it never spawns threads or timers.

use std::time::Instant;

use gmc_models::{FrameMetrics, Gesture, Landmark, LandmarkSet};
use tracing::{debug, info};

use crate::classifier::classify;
use crate::config::{KeyMode, PipelineConfig};
use crate::dispatcher::{ActionDispatcher, KeyPresser, LoggingKeyPresser};
use crate::error::{PipelineError, PipelineResult};
use crate::frame_metrics::MetricsAggregator;
use crate::gate::{CooldownGate, GateDecision, GateState};
use crate::telemetry;

/// Timestamps of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// When the frame was captured or began processing.
    pub started_at: Instant,
    /// When landmark detection finished. Used for gating and latency.
    pub detected_at: Instant,
}

impl FrameTiming {
    pub fn new(started_at: Instant, detected_at: Instant) -> Self {
        Self {
            started_at,
            detected_at,
        }
    }
}

impl From<Instant> for FrameTiming {
    fn from(now: Instant) -> Self {
        Self::new(now, now)
    }
}

/// Result of a single step, for callers that want more than metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub metrics: FrameMetrics,
    pub decision: GateDecision,
}

/// Classifier, gate, dispatcher and metrics for one session.
pub struct FramePipeline<K: KeyPresser = Box<dyn KeyPresser>> {
    gate: CooldownGate,
    dispatcher: ActionDispatcher<K>,
    metrics: MetricsAggregator,
    latest: FrameMetrics,
}

impl FramePipeline<Box<dyn KeyPresser>> {
    /// Build a pipeline and its key presser from configuration.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let presser = key_presser_for(config.key_mode)?;
        info!(
            policy = %config.cooldown_policy,
            key_mode = %config.key_mode,
            presser = presser.name(),
            "Frame pipeline ready"
        );
        Ok(Self::with_presser(config, presser))
    }
}

impl<K: KeyPresser> FramePipeline<K> {
    pub fn with_presser(config: &PipelineConfig, presser: K) -> Self {
        Self {
            gate: CooldownGate::new(config.bindings.clone(), config.cooldown_policy),
            dispatcher: ActionDispatcher::new(config.bindings.clone(), presser),
            metrics: MetricsAggregator::new(config.fps_smoothing),
            latest: FrameMetrics::default(),
        }
    }

    /// Process one frame and return its metrics.
    ///
    /// `landmarks` is `None` when no hand was detected. A malformed set is
    /// rejected before classification and leaves all state untouched.
    pub fn step(
        &mut self,
        landmarks: Option<&[Landmark]>,
        timing: impl Into<FrameTiming>,
    ) -> PipelineResult<FrameMetrics> {
        self.step_detailed(landmarks, timing).map(|o| o.metrics)
    }

    /// Like [`step`](Self::step), also reporting the gate decision.
    pub fn step_detailed(
        &mut self,
        landmarks: Option<&[Landmark]>,
        timing: impl Into<FrameTiming>,
    ) -> PipelineResult<StepOutcome> {
        let timing = timing.into();

        let gesture = match landmarks {
            None => Gesture::None,
            Some(points) => {
                let set = LandmarkSet::new(points).map_err(|e| {
                    telemetry::record_contract_violation();
                    PipelineError::from(e)
                })?;
                classify(&set)
            }
        };

        let decision = self.gate.decide(gesture, timing.detected_at);
        match decision {
            GateDecision::Fired(g) => {
                debug!(gesture = %g, "Gesture fired");
                telemetry::record_gesture_fired(g);
                self.dispatcher.dispatch(g);
            }
            GateDecision::Suppressed(g) => telemetry::record_gesture_suppressed(g),
            GateDecision::Idle => {}
        }

        let metrics = self.metrics.record(timing.started_at, timing.detected_at, gesture);
        telemetry::record_frame(metrics.latency_ms);
        self.latest = metrics;

        Ok(StepOutcome { metrics, decision })
    }

    /// Metrics of the last successfully processed frame.
    pub fn latest(&self) -> FrameMetrics {
        self.latest
    }

    pub fn gate_state(&self) -> &GateState {
        self.gate.state()
    }

    pub fn presser(&self) -> &K {
        self.dispatcher.presser()
    }
}

/// Key presser for a configured mode.
pub fn key_presser_for(mode: KeyMode) -> PipelineResult<Box<dyn KeyPresser>> {
    match mode {
        KeyMode::DryRun => Ok(Box::new(LoggingKeyPresser)),
        #[cfg(feature = "keyboard")]
        KeyMode::Keyboard => {
            let presser = crate::dispatcher::EnigoKeyPresser::new()
                .map_err(|e| PipelineError::collaborator_unavailable(e.to_string()))?;
            Ok(Box::new(presser))
        }
        #[cfg(not(feature = "keyboard"))]
        KeyMode::Keyboard => Err(PipelineError::collaborator_unavailable(
            "keyboard support not compiled in (enable the `keyboard` feature or set GMC_KEY_MODE=dry_run)",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fixtures::{fist, open_palm};
    use crate::dispatcher::RecordingKeyPresser;
    use gmc_models::MediaAction;
    use std::time::Duration;

    fn pipeline() -> FramePipeline<RecordingKeyPresser> {
        FramePipeline::with_presser(&PipelineConfig::default(), RecordingKeyPresser::default())
    }

    #[test]
    fn test_absent_landmarks_yield_none() {
        let mut p = pipeline();
        let m = p.step(None, Instant::now()).unwrap();
        assert_eq!(m.gesture, Gesture::None);
        assert!(p.gate_state().is_pristine());
        assert!(p.presser().pressed.is_empty());
    }

    #[test]
    fn test_palm_fires_and_dispatches() {
        let mut p = pipeline();
        let palm = open_palm();
        let m = p.step(Some(palm.as_slice()), Instant::now()).unwrap();
        assert_eq!(m.gesture, Gesture::PlayPause);
        assert_eq!(p.presser().pressed, vec![MediaAction::PlayPause]);
        assert_eq!(p.latest(), m);
    }

    #[test]
    fn test_contract_violation_leaves_state_untouched() {
        let mut p = pipeline();
        let t0 = Instant::now();
        p.step(Some(fist().as_slice()), t0).unwrap();
        let before_gate = p.gate_state().clone();
        let before_latest = p.latest();

        let palm = open_palm();
        let short = &palm[..5];
        let err = p.step(Some(short), t0 + Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, PipelineError::ContractViolation { expected: 21, actual: 5 }));
        assert_eq!(p.gate_state(), &before_gate);
        assert_eq!(p.latest(), before_latest);
    }

    #[test]
    fn test_latency_uses_frame_timing() {
        let mut p = pipeline();
        let t0 = Instant::now();
        let m = p
            .step(None, FrameTiming::new(t0, t0 + Duration::from_millis(20)))
            .unwrap();
        assert_eq!(m.latency_ms, 20);
        assert_eq!(m.fps, 0.0);

        let t1 = t0 + Duration::from_millis(50);
        let m = p.step(None, t1).unwrap();
        assert!((m.fps - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_dry_run_presser_from_config() {
        let config = PipelineConfig {
            key_mode: KeyMode::DryRun,
            ..PipelineConfig::default()
        };
        let mut p = FramePipeline::from_config(&config).unwrap();
        assert_eq!(p.presser().name(), "dry-run");
        assert!(p.step(Some(fist().as_slice()), Instant::now()).is_ok());
    }
}
