//! Shared data models for the gesture media control pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - The gesture vocabulary
//! - Validated hand landmark sets
//! - Gesture-to-media-key bindings and cooldown policy
//! - Per-frame metrics and the status payload

pub mod action;
pub mod gesture;
pub mod landmark;
pub mod status;

// Re-export common types
pub use action::{
    ActionBinding, BindingTable, CooldownPolicy, CooldownPolicyParseError, MediaAction,
    MediaActionParseError, DEFAULT_MEDIA_COOLDOWN_MS, DEFAULT_VOLUME_COOLDOWN_MS,
};
pub use gesture::{Gesture, GestureParseError};
pub use landmark::{Landmark, LandmarkError, LandmarkSet, LANDMARK_COUNT};
pub use status::{FrameMetrics, StatusSnapshot};
