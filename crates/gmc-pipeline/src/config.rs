//! Pipeline configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use gmc_models::{
    ActionBinding, BindingTable, CooldownPolicy, DEFAULT_MEDIA_COOLDOWN_MS,
    DEFAULT_VOLUME_COOLDOWN_MS,
};
use serde::Deserialize;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::frame_metrics::FpsSmoothing;

/// How fired actions reach the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Real media key presses (requires the `keyboard` feature).
    Keyboard,
    /// Log only.
    DryRun,
}

impl Default for KeyMode {
    fn default() -> Self {
        if cfg!(feature = "keyboard") {
            KeyMode::Keyboard
        } else {
            KeyMode::DryRun
        }
    }
}

impl KeyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMode::Keyboard => "keyboard",
            KeyMode::DryRun => "dry_run",
        }
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KeyMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "keyboard" | "keys" => Ok(KeyMode::Keyboard),
            "dry_run" | "dryrun" | "log" => Ok(KeyMode::DryRun),
            other => Err(PipelineError::config(format!("unknown key mode: {other}"))),
        }
    }
}

/// Load-time settings for a [`FramePipeline`](crate::FramePipeline).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bindings: BindingTable,
    pub cooldown_policy: CooldownPolicy,
    pub fps_smoothing: FpsSmoothing,
    pub key_mode: KeyMode,
    /// Hand landmark model; `None` uses the default search paths.
    pub model_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bindings: BindingTable::default(),
            cooldown_policy: CooldownPolicy::default(),
            fps_smoothing: FpsSmoothing::default(),
            key_mode: KeyMode::default(),
            model_path: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    ///
    /// Numeric values that fail to parse fall back to defaults; unknown
    /// enum names and unreadable bindings files are errors.
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_ms = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let media = Duration::from_millis(parse_ms("GMC_MEDIA_COOLDOWN_MS", DEFAULT_MEDIA_COOLDOWN_MS));
        let volume =
            Duration::from_millis(parse_ms("GMC_VOLUME_COOLDOWN_MS", DEFAULT_VOLUME_COOLDOWN_MS));

        // The file overrides per gesture; gestures it leaves out keep the env cooldowns.
        let env_bindings = BindingTable::with_cooldowns(media, volume);
        let bindings = match lookup("GMC_BINDINGS_FILE").filter(|s| !s.trim().is_empty()) {
            Some(path) => load_bindings_file_over(path.trim(), env_bindings)?,
            None => env_bindings,
        };

        let cooldown_policy = match lookup("GMC_COOLDOWN_POLICY") {
            Some(s) => s
                .parse::<CooldownPolicy>()
                .map_err(|e| PipelineError::config(e.to_string()))?,
            None => CooldownPolicy::default(),
        };

        let fps_smoothing = lookup("GMC_FPS_SMOOTHING_ALPHA")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(FpsSmoothing::ema)
            .unwrap_or_default();

        let key_mode = match lookup("GMC_KEY_MODE") {
            Some(s) => s.parse()?,
            None => KeyMode::default(),
        };

        let model_path = lookup("GMC_MODEL_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bindings,
            cooldown_policy,
            fps_smoothing,
            key_mode,
            model_path,
        })
    }
}

/// Per-gesture entries of a bindings file.
#[derive(Debug, Deserialize)]
struct BindingOverrides {
    play_pause: Option<ActionBinding>,
    volume_up: Option<ActionBinding>,
    mute: Option<ActionBinding>,
}

/// Read a JSON binding table. Missing gestures keep their default binding.
pub fn load_bindings_file(path: impl AsRef<Path>) -> PipelineResult<BindingTable> {
    load_bindings_file_over(path, BindingTable::default())
}

/// Read a JSON binding table on top of `base`. Gestures the file leaves out
/// keep their binding from `base`.
pub fn load_bindings_file_over(
    path: impl AsRef<Path>,
    base: BindingTable,
) -> PipelineResult<BindingTable> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::config(format!("cannot read bindings file {}: {e}", path.display()))
    })?;
    let overrides: BindingOverrides = serde_json::from_str(&content).map_err(|e| {
        PipelineError::config(format!("invalid bindings file {}: {e}", path.display()))
    })?;

    let table = BindingTable {
        play_pause: overrides.play_pause.unwrap_or(base.play_pause),
        volume_up: overrides.volume_up.unwrap_or(base.volume_up),
        mute: overrides.mute.unwrap_or(base.mute),
    };
    info!(path = %path.display(), "Loaded gesture bindings");
    Ok(table)
}
