//! Gesture vocabulary recognized by the pose classifier.
//!
//! The set is closed: adding a gesture means adding a variant here plus a
//! classifier rule and a binding, never a new runtime type.
//!
//! - `None`: no recognized pose (or no hand in frame)
//! - `PlayPause`: open palm, all four fingers extended
//! - `VolumeUp`: index finger pointing up, middle and ring curled
//! - `Mute`: closed fist

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Symbolic label produced for every processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gesture {
    /// No actionable pose.
    #[default]
    None,

    /// Open palm.
    PlayPause,

    /// Index-only point.
    VolumeUp,

    /// Closed fist.
    Mute,
}

impl Gesture {
    /// All gestures, `None` included.
    pub const ALL: &'static [Gesture] = &[
        Gesture::None,
        Gesture::PlayPause,
        Gesture::VolumeUp,
        Gesture::Mute,
    ];

    /// Gestures that can be bound to an action.
    pub const ACTIONABLE: &'static [Gesture] =
        &[Gesture::PlayPause, Gesture::VolumeUp, Gesture::Mute];

    /// Wire name used in status JSON and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::None => "NONE",
            Gesture::PlayPause => "PLAY_PAUSE",
            Gesture::VolumeUp => "VOLUME_UP",
            Gesture::Mute => "MUTE",
        }
    }

    /// Human-readable description of the pose.
    pub fn description(&self) -> &'static str {
        match self {
            Gesture::None => "No gesture",
            Gesture::PlayPause => "Open palm",
            Gesture::VolumeUp => "Index finger up",
            Gesture::Mute => "Closed fist",
        }
    }

    /// Returns true for `Gesture::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Gesture::None)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Gesture {
    type Err = GestureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "NONE" => Ok(Gesture::None),
            "PLAY_PAUSE" | "PALM" | "PALM_PLAY_PAUSE" => Ok(Gesture::PlayPause),
            "VOLUME_UP" | "VOL_UP" | "INDEX_UP" | "INDEX_UP_VOL" => Ok(Gesture::VolumeUp),
            "MUTE" | "FIST" | "FIST_MUTE" => Ok(Gesture::Mute),
            _ => Err(GestureParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown gesture: {0}")]
pub struct GestureParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_parse() {
        assert_eq!("NONE".parse::<Gesture>().unwrap(), Gesture::None);
        assert_eq!("play_pause".parse::<Gesture>().unwrap(), Gesture::PlayPause);
        assert_eq!("VOL_UP".parse::<Gesture>().unwrap(), Gesture::VolumeUp);
        assert_eq!("volume-up".parse::<Gesture>().unwrap(), Gesture::VolumeUp);
        assert_eq!("FIST_MUTE".parse::<Gesture>().unwrap(), Gesture::Mute);
        assert!("thumbs_up".parse::<Gesture>().is_err());
    }

    #[test]
    fn test_gesture_display_matches_serde() {
        for gesture in Gesture::ALL {
            let json = serde_json::to_string(gesture).unwrap();
            assert_eq!(json, format!("\"{}\"", gesture));
        }
    }

    #[test]
    fn test_actionable_excludes_none() {
        assert!(!Gesture::ACTIONABLE.contains(&Gesture::None));
        assert_eq!(Gesture::ACTIONABLE.len(), Gesture::ALL.len() - 1);
    }
}
