//! Step execution capability.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::Result;
use crate::types::{ExecutionContext, PerformanceMode, WorkflowStatus};

/// What a step hands to its executor.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub step_id: String,
    pub instance_id: String,
    /// 0 on the first attempt, incremented on each in-place retry.
    pub attempt: u32,
    /// Snapshot of the instance context (earlier step results, variables, user, device).
    pub context: ExecutionContext,
    pub performance_mode: PerformanceMode,
    status: watch::Receiver<WorkflowStatus>,
}

impl StepContext {
    pub fn new(
        step_id: impl Into<String>,
        instance_id: impl Into<String>,
        attempt: u32,
        context: ExecutionContext,
        performance_mode: PerformanceMode,
        status: watch::Receiver<WorkflowStatus>,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            instance_id: instance_id.into(),
            attempt,
            context,
            performance_mode,
            status,
        }
    }

    /// Live status of the owning instance.
    pub fn status(&self) -> WorkflowStatus {
        *self.status.borrow()
    }

    /// Cooperative cancellation check; executors should poll this between units of work.
    pub fn is_cancelled(&self) -> bool {
        self.status() == WorkflowStatus::Cancelled
    }

    pub fn is_paused(&self) -> bool {
        self.status() == WorkflowStatus::Paused
    }

    /// Timeout the executor is expected to enforce, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.context.constraints.timeout_seconds.map(Duration::from_secs)
    }
}

/// Output of a successful step plus the metrics it reports about itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub output: serde_json::Value,
    pub memory_used_bytes: u64,
    pub network_calls: u32,
}

impl StepOutcome {
    pub fn new(output: serde_json::Value) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    pub fn with_network_calls(mut self, calls: u32) -> Self {
        self.network_calls = calls;
        self
    }

    pub fn with_memory_used(mut self, bytes: u64) -> Self {
        self.memory_used_bytes = bytes;
        self
    }
}

impl From<serde_json::Value> for StepOutcome {
    fn from(output: serde_json::Value) -> Self {
        Self::new(output)
    }
}

/// The business logic of one step, supplied by the calling application.
#[async_trait]
pub trait Executable: Send + Sync {
    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome>;
}

/// Closures returning a future are executables.
#[async_trait]
impl<F, Fut> Executable for F
where
    F: Fn(StepContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StepOutcome>> + Send,
{
    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome> {
        (self)(ctx.clone()).await
    }
}
