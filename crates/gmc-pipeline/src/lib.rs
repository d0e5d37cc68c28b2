#![deny(unreachable_patterns)]
//! Hand gesture to media key pipeline.
//!
//! This crate provides:
//! - A geometric pose classifier over 21-point hand landmarks
//! - A cooldown gate turning per-frame gestures into sparse fire events
//! - Fire-and-forget dispatch to a pluggable key presser
//! - Per-frame latency/FPS metrics and a single-call frame orchestrator
//! - Landmark recording replay
//! - Optional adapters: OpenCV camera and overlay (`opencv`), ONNX Runtime
//!   hand landmarker (`onnx`), OS media keys via enigo (`keyboard`)

pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod frame_metrics;
pub mod gate;
pub mod pipeline;
pub mod replay;
pub mod source;
pub mod telemetry;

#[cfg(feature = "opencv")]
pub mod capture;
#[cfg(feature = "onnx")]
pub mod landmarker;

pub use classifier::{classify, finger_states, FingerStates};
pub use config::{load_bindings_file, load_bindings_file_over, KeyMode, PipelineConfig};
pub use dispatcher::{ActionDispatcher, KeyPresser, LoggingKeyPresser, RecordingKeyPresser};
#[cfg(feature = "keyboard")]
pub use dispatcher::EnigoKeyPresser;
pub use error::{DispatchError, PipelineError, PipelineResult};
pub use frame_metrics::{compute_frame_metrics, FpsSmoothing, MetricsAggregator};
pub use gate::{CooldownGate, GateDecision, GateState};
pub use pipeline::{key_presser_for, FramePipeline, FrameTiming, StepOutcome};
pub use replay::{load_recording, parse_recording, replay, FireEvent, RecordedFrame, ReplaySummary};
pub use source::{LandmarkSource, PrecomputedSource};

#[cfg(feature = "opencv")]
pub use capture::{draw_landmarks, draw_overlay, encode_jpeg, Camera, CameraConfig};
#[cfg(feature = "onnx")]
pub use landmarker::OrtHandLandmarker;
