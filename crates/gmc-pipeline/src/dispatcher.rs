//! Action dispatch: fired gesture to media key press.
//!
//! Dispatch is fire-and-forget. A failing key press is logged and counted,
//! then dropped; the frame step never sees it.

use gmc_models::{BindingTable, Gesture, MediaAction};
use tracing::{debug, info, warn};

use crate::error::DispatchError;
use crate::telemetry;

/// Key-press collaborator.
pub trait KeyPresser {
    /// Press and release one media key.
    fn press(&mut self, action: MediaAction) -> Result<(), DispatchError>;
    fn name(&self) -> &str;
}

impl<K: KeyPresser + ?Sized> KeyPresser for Box<K> {
    fn press(&mut self, action: MediaAction) -> Result<(), DispatchError> {
        (**self).press(action)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Dry-run presser that only logs.
#[derive(Debug, Default, Clone)]
pub struct LoggingKeyPresser;

impl KeyPresser for LoggingKeyPresser {
    fn press(&mut self, action: MediaAction) -> Result<(), DispatchError> {
        info!(action = %action, "Dry run: media key not sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

/// Presser that records every action, optionally failing each one.
#[derive(Debug, Default, Clone)]
pub struct RecordingKeyPresser {
    pub pressed: Vec<MediaAction>,
    pub fail: bool,
}

impl RecordingKeyPresser {
    pub fn failing() -> Self {
        Self {
            pressed: Vec::new(),
            fail: true,
        }
    }
}

impl KeyPresser for RecordingKeyPresser {
    fn press(&mut self, action: MediaAction) -> Result<(), DispatchError> {
        self.pressed.push(action);
        if self.fail {
            return Err(DispatchError::key_press(action.as_str(), "simulated failure"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(feature = "keyboard")]
mod enigo_presser {
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};
    use gmc_models::MediaAction;

    use super::KeyPresser;
    use crate::error::DispatchError;

    /// Sends OS media keys through `enigo`.
    pub struct EnigoKeyPresser {
        enigo: Enigo,
    }

    impl EnigoKeyPresser {
        pub fn new() -> Result<Self, DispatchError> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| DispatchError::Unavailable(format!("failed to init enigo: {e}")))?;
            Ok(Self { enigo })
        }
    }

    fn media_key(action: MediaAction) -> Option<Key> {
        match action {
            MediaAction::PlayPause => Some(Key::MediaPlayPause),
            MediaAction::VolumeUp => Some(Key::VolumeUp),
            MediaAction::VolumeDown => Some(Key::VolumeDown),
            MediaAction::VolumeMute => Some(Key::VolumeMute),
            MediaAction::NextTrack => Some(Key::MediaNextTrack),
            MediaAction::PrevTrack => Some(Key::MediaPrevTrack),
            #[cfg(not(target_os = "macos"))]
            MediaAction::Stop => Some(Key::MediaStop),
            #[cfg(target_os = "macos")]
            MediaAction::Stop => None,
        }
    }

    impl KeyPresser for EnigoKeyPresser {
        fn press(&mut self, action: MediaAction) -> Result<(), DispatchError> {
            let key = media_key(action).ok_or_else(|| {
                DispatchError::key_press(action.as_str(), "key not supported on this platform")
            })?;
            self.enigo
                .key(key, Direction::Click)
                .map_err(|e| DispatchError::key_press(action.as_str(), e.to_string()))
        }

        fn name(&self) -> &str {
            "enigo"
        }
    }
}

#[cfg(feature = "keyboard")]
pub use enigo_presser::EnigoKeyPresser;

/// Maps fired gestures to bound actions and presses them.
pub struct ActionDispatcher<K: KeyPresser> {
    bindings: BindingTable,
    presser: K,
}

impl<K: KeyPresser> ActionDispatcher<K> {
    pub fn new(bindings: BindingTable, presser: K) -> Self {
        Self { bindings, presser }
    }

    pub fn presser(&self) -> &K {
        &self.presser
    }

    /// Press the key bound to `gesture`, exactly once. Returns the action
    /// that was attempted, whether or not the press succeeded.
    pub fn dispatch(&mut self, gesture: Gesture) -> Option<MediaAction> {
        let action = self.bindings.get(gesture)?.action;

        match self.presser.press(action) {
            Ok(()) => {
                debug!(gesture = %gesture, action = %action, presser = self.presser.name(), "Media key sent");
            }
            Err(e) => {
                warn!(gesture = %gesture, action = %action, error = %e, "Media key press failed");
                telemetry::record_dispatch_failure(action);
            }
        }

        Some(action)
    }
}
