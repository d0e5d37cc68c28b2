//! Gesture-to-action bindings.
//!
//! A binding pairs each actionable gesture with the media key it triggers and
//! the minimum interval before another fire is accepted. The table is loaded
//! once at startup and never mutated afterwards.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::Gesture;

/// Default cooldown for play/pause and mute.
pub const DEFAULT_MEDIA_COOLDOWN_MS: u64 = 1000;

/// Default cooldown for volume steps.
pub const DEFAULT_VOLUME_COOLDOWN_MS: u64 = 200;

/// Media key understood by the key-press collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaAction {
    PlayPause,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    NextTrack,
    PrevTrack,
    Stop,
}

impl MediaAction {
    pub const ALL: &'static [MediaAction] = &[
        MediaAction::PlayPause,
        MediaAction::VolumeUp,
        MediaAction::VolumeDown,
        MediaAction::VolumeMute,
        MediaAction::NextTrack,
        MediaAction::PrevTrack,
        MediaAction::Stop,
    ];

    /// Key name as passed to the key-press collaborator.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaAction::PlayPause => "playpause",
            MediaAction::VolumeUp => "volumeup",
            MediaAction::VolumeDown => "volumedown",
            MediaAction::VolumeMute => "volumemute",
            MediaAction::NextTrack => "nexttrack",
            MediaAction::PrevTrack => "prevtrack",
            MediaAction::Stop => "stop",
        }
    }
}

impl fmt::Display for MediaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaAction {
    type Err = MediaActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        MediaAction::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| MediaActionParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown media action: {0}")]
pub struct MediaActionParseError(String);

/// Action and minimum re-fire interval for one gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActionBinding {
    pub action: MediaAction,
    pub cooldown_ms: u64,
}

impl ActionBinding {
    pub fn new(action: MediaAction, cooldown: Duration) -> Self {
        Self {
            action,
            cooldown_ms: cooldown.as_millis() as u64,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// How cooldown windows are measured across gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// One clock shared by every gesture: any accepted fire restarts the
    /// window for all of them.
    #[default]
    Shared,

    /// Independent clock per gesture.
    PerGesture,
}

impl CooldownPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CooldownPolicy::Shared => "shared",
            CooldownPolicy::PerGesture => "per_gesture",
        }
    }
}

impl fmt::Display for CooldownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CooldownPolicy {
    type Err = CooldownPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "shared" | "global" => Ok(CooldownPolicy::Shared),
            "per_gesture" | "independent" => Ok(CooldownPolicy::PerGesture),
            _ => Err(CooldownPolicyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown cooldown policy: {0}")]
pub struct CooldownPolicyParseError(String);

/// Binding for every actionable gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BindingTable {
    pub play_pause: ActionBinding,
    pub volume_up: ActionBinding,
    pub mute: ActionBinding,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self {
            play_pause: ActionBinding {
                action: MediaAction::PlayPause,
                cooldown_ms: DEFAULT_MEDIA_COOLDOWN_MS,
            },
            volume_up: ActionBinding {
                action: MediaAction::VolumeUp,
                cooldown_ms: DEFAULT_VOLUME_COOLDOWN_MS,
            },
            mute: ActionBinding {
                action: MediaAction::VolumeMute,
                cooldown_ms: DEFAULT_MEDIA_COOLDOWN_MS,
            },
        }
    }
}

impl BindingTable {
    /// Default actions with the given media (play/pause, mute) and volume cooldowns.
    pub fn with_cooldowns(media: Duration, volume: Duration) -> Self {
        Self {
            play_pause: ActionBinding::new(MediaAction::PlayPause, media),
            volume_up: ActionBinding::new(MediaAction::VolumeUp, volume),
            mute: ActionBinding::new(MediaAction::VolumeMute, media),
        }
    }

    /// Binding for a gesture; `None` has no binding.
    pub fn get(&self, gesture: Gesture) -> Option<&ActionBinding> {
        match gesture {
            Gesture::None => None,
            Gesture::PlayPause => Some(&self.play_pause),
            Gesture::VolumeUp => Some(&self.volume_up),
            Gesture::Mute => Some(&self.mute),
        }
    }

    /// Iterate over `(gesture, binding)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Gesture, &ActionBinding)> {
        Gesture::ACTIONABLE
            .iter()
            .filter_map(move |g| self.get(*g).map(|b| (*g, b)))
    }
}
