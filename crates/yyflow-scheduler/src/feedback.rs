//! Feedback Signaler: coarse haptic cues on lifecycle transitions.
//! Best-effort: hardware errors are swallowed, a missing capability is skipped.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use yyflow_core::config::FeedbackConfig;
use yyflow_core::traits::{HapticSink, NoopHaptics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackIntensity {
    /// Pause.
    Light,
    /// Start, resume, success.
    Medium,
    /// Stop, failure.
    Heavy,
}

impl std::fmt::Display for FeedbackIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackIntensity::Light => write!(f, "light"),
            FeedbackIntensity::Medium => write!(f, "medium"),
            FeedbackIntensity::Heavy => write!(f, "heavy"),
        }
    }
}

pub struct FeedbackSignaler {
    sink: Arc<dyn HapticSink>,
    config: FeedbackConfig,
}

impl FeedbackSignaler {
    pub fn new(sink: Arc<dyn HapticSink>, config: FeedbackConfig) -> Self {
        Self { sink, config }
    }

    pub fn pattern(&self, intensity: FeedbackIntensity) -> &[u64] {
        match intensity {
            FeedbackIntensity::Light => &self.config.light,
            FeedbackIntensity::Medium => &self.config.medium,
            FeedbackIntensity::Heavy => &self.config.heavy,
        }
    }

    /// Fire a signal. Never fails.
    pub fn signal(&self, intensity: FeedbackIntensity) {
        if !self.config.enabled || !self.sink.is_available() {
            return;
        }
        if let Err(e) = self.sink.vibrate(self.pattern(intensity)) {
            tracing::debug!("📳 Haptic {} signal dropped: {}", intensity, e);
        }
    }
}

impl Default for FeedbackSignaler {
    fn default() -> Self {
        Self::new(Arc::new(NoopHaptics), FeedbackConfig::default())
    }
}
