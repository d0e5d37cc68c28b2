//! Error types for the gesture pipeline.

use gmc_models::LandmarkError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can cross the pipeline boundary.
///
/// Steady-state frame processing only fails on a malformed landmark set;
/// everything else is raised at initialization or by the capture adapters.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Landmark contract violation: expected {expected} landmarks, got {actual}")]
    ContractViolation { expected: usize, actual: usize },

    #[error("Landmark contract violation: landmark {index} is not finite")]
    NonFiniteLandmark { index: usize },

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Landmark inference failed: {0}")]
    Inference(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn collaborator_unavailable(message: impl Into<String>) -> Self {
        Self::CollaboratorUnavailable(message.into())
    }

    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for malformed landmark sets handed over by the landmark source.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            PipelineError::ContractViolation { .. } | PipelineError::NonFiniteLandmark { .. }
        )
    }

    /// True for per-frame failures the frame loop should log and skip.
    pub fn is_frame_local(&self) -> bool {
        self.is_contract_violation()
            || matches!(self, PipelineError::Capture(_) | PipelineError::Inference(_))
    }
}

impl From<LandmarkError> for PipelineError {
    fn from(err: LandmarkError) -> Self {
        match err {
            LandmarkError::WrongCount { expected, actual } => {
                PipelineError::ContractViolation { expected, actual }
            }
            LandmarkError::NonFinite { index } => PipelineError::NonFiniteLandmark { index },
        }
    }
}

/// Failure reported by the key-press collaborator.
///
/// Never propagated out of the dispatcher: logged and counted, then dropped.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Key press backend unavailable: {0}")]
    Unavailable(String),

    #[error("Key press failed for {action}: {message}")]
    KeyPress { action: String, message: String },
}

impl DispatchError {
    pub fn key_press(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::KeyPress {
            action: action.into(),
            message: message.into(),
        }
    }
}
