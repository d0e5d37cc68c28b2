//! End-to-end frame sequences through the pipeline.

use std::time::{Duration, Instant};

use gmc_models::{CooldownPolicy, Gesture, Landmark, MediaAction};
use gmc_pipeline::classifier::fixtures::{fist, hand_points, index_up, open_palm};
use gmc_pipeline::{
    FingerStates, FramePipeline, FrameTiming, PipelineConfig, PipelineError, RecordingKeyPresser,
};

fn pipeline(config: &PipelineConfig) -> FramePipeline<RecordingKeyPresser> {
    FramePipeline::with_presser(config, RecordingKeyPresser::default())
}

/// Frame `i` of a 30 fps stream.
fn at_30fps(base: Instant, i: u64) -> Instant {
    base + Duration::from_nanos(i * 1_000_000_000 / 30)
}

#[test]
fn test_held_palm_fires_once_per_second() {
    let mut p = pipeline(&PipelineConfig::default());
    let base = Instant::now();
    let palm = open_palm();

    let mut fired_at = Vec::new();
    for i in 0..90 {
        let outcome = p.step_detailed(Some(palm.as_slice()), at_30fps(base, i)).unwrap();
        assert_eq!(outcome.metrics.gesture, Gesture::PlayPause);
        if outcome.decision.fired().is_some() {
            fired_at.push(i);
        }
    }

    // Frame 30 lands exactly on the 1s boundary and is rejected.
    assert_eq!(fired_at, vec![0, 31, 62]);
    assert_eq!(p.presser().pressed, vec![MediaAction::PlayPause; 3]);
}

#[test]
fn test_alternating_gestures_share_one_clock() {
    let mut p = pipeline(&PipelineConfig::default());
    let base = Instant::now();
    let palm = open_palm();
    let fist = fist();

    for i in 0..30 {
        let frame = if i % 2 == 0 { &palm } else { &fist };
        p.step(Some(frame.as_slice()), at_30fps(base, i)).unwrap();
    }

    assert_eq!(p.presser().pressed, vec![MediaAction::PlayPause]);
    assert_eq!(p.latest().gesture, Gesture::Mute);
}

#[test]
fn test_short_landmark_set_is_contract_violation() {
    let mut p = pipeline(&PipelineConfig::default());
    let five = vec![Landmark::xy(0.5, 0.5); 5];

    let err = p.step(Some(five.as_slice()), Instant::now()).unwrap_err();
    assert!(err.is_contract_violation());
    assert!(matches!(err, PipelineError::ContractViolation { expected: 21, actual: 5 }));
    assert!(p.gate_state().is_pristine());
    assert!(p.presser().pressed.is_empty());
}

#[test]
fn test_non_finite_landmark_is_rejected() {
    let mut p = pipeline(&PipelineConfig::default());
    let mut points = open_palm();
    points[3].x = f32::INFINITY;

    let err = p.step(Some(points.as_slice()), Instant::now()).unwrap_err();
    assert!(matches!(err, PipelineError::NonFiniteLandmark { index: 3 }));
}

#[test]
fn test_dispatch_failure_does_not_fail_step() {
    let mut p = FramePipeline::with_presser(&PipelineConfig::default(), RecordingKeyPresser::failing());
    let base = Instant::now();

    let m = p.step(Some(index_up().as_slice()), base).unwrap();
    assert_eq!(m.gesture, Gesture::VolumeUp);
    // The failed press still counts as a fire: no retry on the next frame.
    p.step(Some(index_up().as_slice()), base + Duration::from_millis(50)).unwrap();
    assert_eq!(p.presser().pressed, vec![MediaAction::VolumeUp]);
    assert_eq!(p.gate_state().last_fire(), Some(base));
}

#[test]
fn test_per_gesture_policy_lets_volume_follow_play_pause() {
    let base = Instant::now();
    let after = base + Duration::from_millis(100);

    let mut shared = pipeline(&PipelineConfig::default());
    shared.step(Some(open_palm().as_slice()), base).unwrap();
    shared.step(Some(index_up().as_slice()), after).unwrap();
    assert_eq!(shared.presser().pressed, vec![MediaAction::PlayPause]);

    let config = PipelineConfig {
        cooldown_policy: CooldownPolicy::PerGesture,
        ..PipelineConfig::default()
    };
    let mut independent = pipeline(&config);
    independent.step(Some(open_palm().as_slice()), base).unwrap();
    independent.step(Some(index_up().as_slice()), after).unwrap();
    assert_eq!(
        independent.presser().pressed,
        vec![MediaAction::PlayPause, MediaAction::VolumeUp]
    );
}

#[test]
fn test_no_hand_frames_never_fire() {
    let mut p = pipeline(&PipelineConfig::default());
    let base = Instant::now();
    for i in 0..1000 {
        let m = p.step(None, at_30fps(base, i)).unwrap();
        assert_eq!(m.gesture, Gesture::None);
    }
    assert!(p.gate_state().is_pristine());
    assert!(p.presser().pressed.is_empty());
}

#[test]
fn test_palm_anywhere_in_frame_is_play_pause() {
    let all_open = FingerStates {
        index: true,
        middle: true,
        ring: true,
        pinky: true,
    };
    for (cx, cy) in [(0.2, 0.3), (0.8, 0.7), (0.5, 0.9)] {
        let mut p = pipeline(&PipelineConfig::default());
        let m = p.step(Some(hand_points(all_open, cx, cy).as_slice()), Instant::now()).unwrap();
        assert_eq!(m.gesture, Gesture::PlayPause);
    }
}

#[test]
fn test_metrics_follow_frame_timing() {
    let mut p = pipeline(&PipelineConfig::default());
    let base = Instant::now();

    let first = p
        .step(None, FrameTiming::new(base, base + Duration::from_millis(20)))
        .unwrap();
    assert_eq!(first.latency_ms, 20);
    assert_eq!(first.fps, 0.0);

    let second_start = base + Duration::from_millis(40);
    let second = p
        .step(None, FrameTiming::new(second_start, second_start + Duration::from_millis(7)))
        .unwrap();
    assert_eq!(second.latency_ms, 7);
    assert!((second.fps - 25.0).abs() < 1e-9);
}
