//! Error types for yyflow.

use crate::types::BlockingFactor;

/// Unified error type for the workflow controller.
#[derive(Debug, thiserror::Error)]
pub enum YyFlowError {
    /// Device conditions are insufficient and no offline override was given.
    #[error("Cannot run right now: {}", format_factors(.factors))]
    AdmissionDenied { factors: Vec<BlockingFactor> },

    /// Another instance is still running or paused.
    #[error("Workflow instance '{0}' is already active")]
    AlreadyRunning(String),

    #[error("Step '{step_id}' failed: {message}")]
    StepExecutionFailed { step_id: String, message: String },

    #[error("Offline replay failed: {0}")]
    OfflineReplayFailed(String),

    #[error("Invalid workflow definition: {0}")]
    InvalidDefinition(String),

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

fn format_factors(factors: &[BlockingFactor]) -> String {
    if factors.is_empty() {
        return "device conditions insufficient".to_string();
    }
    factors
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl YyFlowError {
    /// Shorthand for a step failure.
    pub fn step(step_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepExecutionFailed {
            step_id: step_id.into(),
            message: message.into(),
        }
    }

    /// Whether the caller can reasonably retry later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AdmissionDenied { .. } | Self::AlreadyRunning(_) | Self::OfflineReplayFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, YyFlowError>;
