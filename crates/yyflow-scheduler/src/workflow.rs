//! Workflow definitions, run options and instance snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use yyflow_core::error::{Result, YyFlowError};
use yyflow_core::traits::{Executable, StepContext, StepOutcome};
use yyflow_core::types::{
    ExecutionConstraints, ExecutionContext, PerformanceMode, UserContext, WorkflowStatus,
};

use crate::steps::StepState;

/// Wrap an async closure as step logic.
pub fn step_fn<F, Fut>(f: F) -> Arc<dyn Executable>
where
    F: Fn(StepContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepOutcome>> + Send + 'static,
{
    Arc::new(f)
}

/// One declared step.
#[derive(Clone)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub executable: Arc<dyn Executable>,
    /// Memoize the output under this key across runs.
    pub cache_key: Option<String>,
    /// In-place retries before the step counts as failed. None = config default.
    pub max_retries: Option<u32>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, executable: Arc<dyn Executable>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            executable,
            cache_key: None,
            max_retries: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn cached(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

impl std::fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cache_key", &self.cache_key)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// Immutable description of a task. Never mutated by the controller.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    /// At least one step, unique step ids.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(YyFlowError::InvalidDefinition(format!(
                "workflow '{}' declares no steps",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(YyFlowError::InvalidDefinition(format!(
                    "duplicate step id '{}' in workflow '{}'",
                    step.id, self.id
                )));
            }
        }
        Ok(())
    }

    pub fn get_step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Begin stepping immediately (default true).
    pub auto_start: bool,
    /// Bypass device checks (not the single-instance rule).
    pub enable_offline_mode: bool,
    pub enable_haptic_feedback: bool,
    /// Pin a performance mode instead of following device updates.
    pub performance_mode: Option<PerformanceMode>,
    pub user: UserContext,
    pub variables: HashMap<String, serde_json::Value>,
    pub constraints: ExecutionConstraints,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            auto_start: true,
            enable_offline_mode: false,
            enable_haptic_feedback: true,
            performance_mode: None,
            user: UserContext::default(),
            variables: HashMap::new(),
            constraints: ExecutionConstraints::default(),
        }
    }
}

impl ExecutionOptions {
    pub fn offline() -> Self {
        Self {
            enable_offline_mode: true,
            ..Default::default()
        }
    }

    pub fn manual_start() -> Self {
        Self {
            auto_start: false,
            ..Default::default()
        }
    }
}

/// Point-in-time view of a workflow instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowInstance {
    pub id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// 1-based pointer, `min(completed + 1, total)`.
    pub current_step: usize,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub progress_percentage: u8,
    pub performance_mode: PerformanceMode,
    pub steps: Vec<StepState>,
    pub context: ExecutionContext,
    /// Step results keyed by step id, set on completion.
    pub result: Option<serde_json::Value>,
    /// Message of the failing step, set on failure.
    pub error: Option<String>,
}

impl WorkflowInstance {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn step(&self, step_id: &str) -> Option<&StepState> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }
}
