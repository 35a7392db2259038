//! Step Tracker: per-step state owned by the active instance.
//!
//! The key set is fixed at construction: one entry per declared step,
//! in declaration order. Nothing is added or removed mid-run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use yyflow_core::error::{Result, YyFlowError};
use yyflow_core::traits::StepOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome metrics (`elapsed_ms`, `memory_used_bytes`, `network_calls`)
/// describe the final attempt only. Earlier failed attempts are counted in
/// `retry_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub elapsed_ms: u64,
    pub memory_used_bytes: u64,
    pub network_calls: u32,
    pub cache_hits: u32,
    pub retry_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    pub step_id: String,
    pub name: String,
    pub status: StepStatus,
    /// 0–100.
    pub progress: u8,
    /// Append-only.
    pub logs: Vec<StepLogEntry>,
    pub metrics: StepMetrics,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepState {
    fn pending(step_id: &str, name: &str) -> Self {
        Self {
            step_id: step_id.to_string(),
            name: name.to_string(),
            status: StepStatus::Pending,
            progress: 0,
            logs: Vec::new(),
            metrics: StepMetrics::default(),
            started_at: None,
            completed_at: None,
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        self.logs.push(StepLogEntry {
            timestamp: Utc::now(),
            message: message.into(),
        });
    }

    /// Most recent log line, used to present failures.
    pub fn last_message(&self) -> Option<&str> {
        self.logs.last().map(|l| l.message.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct StepTracker {
    order: Vec<String>,
    states: HashMap<String, StepState>,
}

impl StepTracker {
    /// Seed one pending entry per `(id, name)` pair.
    pub fn new<'a>(steps: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut order = Vec::new();
        let mut states = HashMap::new();
        for (id, name) in steps {
            order.push(id.to_string());
            states.insert(id.to_string(), StepState::pending(id, name));
        }
        Self { order, states }
    }

    fn entry(&mut self, step_id: &str) -> Result<&mut StepState> {
        self.states
            .get_mut(step_id)
            .ok_or_else(|| YyFlowError::UnknownStep(step_id.to_string()))
    }

    pub fn mark_running(&mut self, step_id: &str) -> Result<()> {
        let state = self.entry(step_id)?;
        state.status = StepStatus::Running;
        state.progress = 0;
        if state.started_at.is_none() {
            state.started_at = Some(Utc::now());
        }
        state.log("started");
        Ok(())
    }

    pub fn mark_completed(&mut self, step_id: &str, outcome: &StepOutcome, elapsed_ms: u64) -> Result<()> {
        let state = self.entry(step_id)?;
        state.status = StepStatus::Completed;
        state.progress = 100;
        state.completed_at = Some(Utc::now());
        state.metrics.elapsed_ms = elapsed_ms;
        state.metrics.memory_used_bytes = outcome.memory_used_bytes;
        state.metrics.network_calls = outcome.network_calls;
        state.log(format!("completed in {elapsed_ms}ms"));
        Ok(())
    }

    /// Completed from the result cache without running the executor.
    pub fn mark_cached(&mut self, step_id: &str) -> Result<()> {
        let state = self.entry(step_id)?;
        state.status = StepStatus::Completed;
        state.progress = 100;
        state.completed_at = Some(Utc::now());
        state.metrics.cache_hits += 1;
        state.log("completed from cache");
        Ok(())
    }

    pub fn mark_failed(&mut self, step_id: &str, message: &str, elapsed_ms: u64) -> Result<()> {
        let state = self.entry(step_id)?;
        state.status = StepStatus::Failed;
        state.completed_at = Some(Utc::now());
        state.metrics.elapsed_ms = elapsed_ms;
        state.log(message.to_string());
        Ok(())
    }

    pub fn record_retry(&mut self, step_id: &str, reason: &str) -> Result<()> {
        let state = self.entry(step_id)?;
        state.metrics.retry_count += 1;
        let attempt = state.metrics.retry_count;
        state.log(format!("retry {attempt} after error: {reason}"));
        Ok(())
    }

    pub fn log(&mut self, step_id: &str, message: &str) -> Result<()> {
        self.entry(step_id)?.log(message.to_string());
        Ok(())
    }

    pub fn get(&self, step_id: &str) -> Option<&StepState> {
        self.states.get(step_id)
    }

    /// States in declaration order.
    pub fn ordered(&self) -> Vec<StepState> {
        self.order
            .iter()
            .filter_map(|id| self.states.get(id).cloned())
            .collect()
    }

    pub fn as_map(&self) -> &HashMap<String, StepState> {
        &self.states
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.states.values().filter(|s| s.status == status).count()
    }

    pub fn completed_count(&self) -> usize {
        self.count(StepStatus::Completed)
    }

    /// Index and id of the first step that has not completed.
    pub fn first_unfinished(&self) -> Option<(usize, &str)> {
        self.order.iter().enumerate().find_map(|(idx, id)| {
            match self.states.get(id) {
                Some(s) if s.status != StepStatus::Completed => Some((idx, id.as_str())),
                _ => None,
            }
        })
    }

    pub fn all_completed(&self) -> bool {
        self.completed_count() == self.total()
    }

    /// 1-based step pointer, derived from completed steps.
    pub fn current_step(&self) -> usize {
        (self.completed_count() + 1).min(self.total())
    }

    /// Derived progress: `round(100 * current_step / total)`.
    pub fn progress_percentage(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (100.0 * self.current_step() as f64 / total as f64).round() as u8
    }

    /// Average elapsed time of completed, non-cached steps.
    pub fn average_step_ms(&self) -> Option<u64> {
        let timed: Vec<u64> = self
            .states
            .values()
            .filter(|s| s.status == StepStatus::Completed && s.metrics.cache_hits == 0)
            .map(|s| s.metrics.elapsed_ms)
            .collect();
        if timed.is_empty() {
            None
        } else {
            Some(timed.iter().sum::<u64>() / timed.len() as u64)
        }
    }
}
