//! Workflow Instance Manager: lifecycle state machine for the current instance.
//!
//! ```text
//! idle ──► running ◄──► paused
//!             │            │
//!             ├──► completed
//!             ├──► failed
//!             └──► cancelled ◄┘
//! ```
//! One instance occupies the slot at a time. Steps run strictly in
//! declaration order on a spawned driver task; pause and stop take effect
//! at step boundaries. State sits behind a mutex that is never held across
//! an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use yyflow_core::config::YyFlowConfig;
use yyflow_core::error::{Result, YyFlowError};
use yyflow_core::traits::{
    DeviceInfoProvider, HapticSink, NoopHaptics, OfflineOperation, OperationProcessor, StepContext,
    StepOutcome,
};
use yyflow_core::types::{
    DeviceContext, DeviceInfo, DeviceStatus, DeviceStatusUpdate, ExecutionContext, PerformanceMode,
    WorkflowStatus,
};

use crate::admission::{AdmissionController, AdmissionDecision};
use crate::cache::{CacheStats, ResultCache};
use crate::device::DeviceMonitor;
use crate::feedback::{FeedbackIntensity, FeedbackSignaler};
use crate::offline::{DrainReport, OfflineQueue, QueueStats};
use crate::steps::{StepState, StepStatus, StepTracker};
use crate::workflow::{ExecutionOptions, WorkflowDefinition, WorkflowInstance, WorkflowStep};

/// What happened to an operation handed to `submit_operation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "entry_id", rename_all = "snake_case")]
pub enum Submission {
    Applied,
    /// Deferred to the offline queue under this entry id.
    Queued(String),
}

struct ActiveInstance {
    id: String,
    definition: Arc<WorkflowDefinition>,
    tracker: StepTracker,
    context: ExecutionContext,
    status_tx: watch::Sender<WorkflowStatus>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    result: Option<serde_json::Value>,
    error: Option<String>,
    pinned_mode: Option<PerformanceMode>,
    haptics: bool,
    /// A driver task is currently stepping this instance.
    driving: bool,
}

impl ActiveInstance {
    fn status(&self) -> WorkflowStatus {
        *self.status_tx.borrow()
    }

    /// Apply a lifecycle edge. Anything outside the table is refused.
    fn transition(&mut self, next: WorkflowStatus) -> bool {
        let current = self.status();
        if !current.can_transition_to(next) {
            tracing::debug!(
                "⏭️ Ignored transition {} → {} for instance {}",
                current,
                next,
                self.id
            );
            return false;
        }
        self.status_tx.send_replace(next);
        if next.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
        tracing::info!("🔀 Workflow '{}' [{}]: {} → {}", self.definition.name, self.id, current, next);
        true
    }

    fn complete(&mut self) -> bool {
        let mut results = serde_json::Map::new();
        for step in &self.definition.steps {
            if let Some(v) = self.context.result(&step.id) {
                results.insert(step.id.clone(), v.clone());
            }
        }
        if !self.transition(WorkflowStatus::Completed) {
            return false;
        }
        self.result = Some(serde_json::Value::Object(results));
        true
    }

    fn fail(&mut self, message: String) -> bool {
        if !self.transition(WorkflowStatus::Failed) {
            return false;
        }
        self.error = Some(message);
        true
    }

    fn snapshot(&self, mode: PerformanceMode) -> WorkflowInstance {
        WorkflowInstance {
            id: self.id.clone(),
            workflow_id: self.definition.id.clone(),
            workflow_name: self.definition.name.clone(),
            status: self.status(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            current_step: self.tracker.current_step(),
            total_steps: self.tracker.total(),
            completed_steps: self.tracker.completed_count(),
            progress_percentage: self.tracker.progress_percentage(),
            performance_mode: self.pinned_mode.unwrap_or(mode),
            steps: self.tracker.ordered(),
            context: self.context.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

#[derive(Default)]
struct ControllerState {
    current: Option<ActiveInstance>,
}

struct Inner {
    config: YyFlowConfig,
    admission: AdmissionController,
    device: DeviceMonitor,
    device_info: Arc<dyn DeviceInfoProvider>,
    feedback: FeedbackSignaler,
    queue: OfflineQueue,
    processor: Option<Arc<dyn OperationProcessor>>,
    cache: Mutex<ResultCache>,
    state: Mutex<ControllerState>,
}

/// A step ready to run outside the lock.
struct Prepared {
    step: WorkflowStep,
    ctx: StepContext,
    max_retries: u32,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_cache(&self) -> MutexGuard<'_, ResultCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn auto_mode(&self) -> PerformanceMode {
        self.admission.performance_mode(&self.device.snapshot())
    }

    fn signal(&self, enabled: bool, intensity: Option<FeedbackIntensity>) {
        if let (true, Some(intensity)) = (enabled, intensity) {
            self.feedback.signal(intensity);
        }
    }

    fn spawn_driver(self: &Arc<Self>, instance_id: String) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| YyFlowError::Runtime(format!("no Tokio runtime to run steps on: {e}")))?;
        let inner = Arc::clone(self);
        handle.spawn(async move { inner.drive(instance_id).await });
        Ok(())
    }

    /// Advance one instance until it finishes, fails, pauses or is cancelled.
    async fn drive(self: Arc<Self>, instance_id: String) {
        loop {
            let prepared = {
                let mut state = self.lock_state();
                let mode = self.auto_mode();
                let Some(inst) = state.current.as_mut().filter(|i| i.id == instance_id) else {
                    return;
                };
                if inst.status() != WorkflowStatus::Running {
                    inst.driving = false;
                    return;
                }

                let next = inst
                    .tracker
                    .first_unfinished()
                    .map(|(_, id)| id.to_string());
                let Some(step_id) = next else {
                    inst.driving = false;
                    let done = inst.complete();
                    let haptics = inst.haptics;
                    drop(state);
                    self.signal(haptics, done.then_some(FeedbackIntensity::Medium));
                    return;
                };

                // A step that failed while the instance was paused fails it on resume.
                if let Some(failed) = inst.tracker.get(&step_id).filter(|s| s.status == StepStatus::Failed) {
                    let message = failed.last_message().unwrap_or("step failed").to_string();
                    inst.driving = false;
                    let failed_now = inst.fail(message);
                    let haptics = inst.haptics;
                    drop(state);
                    self.signal(haptics, failed_now.then_some(FeedbackIntensity::Heavy));
                    return;
                }

                let Some(step) = inst.definition.get_step(&step_id).cloned() else {
                    inst.driving = false;
                    return;
                };
                if inst.tracker.mark_running(&step_id).is_err() {
                    inst.driving = false;
                    return;
                }

                if self.config.cache.enabled {
                    if let Some(key) = &step.cache_key {
                        if let Some(cached) = self.lock_cache().get(key) {
                            tracing::debug!("⚡ Step '{}' served from cache ({})", step_id, key);
                            if let Err(e) = inst.tracker.mark_cached(&step_id) {
                                tracing::warn!("⚠️ Step tracker out of sync for '{}': {}", step_id, e);
                            }
                            inst.context.record_result(&step_id, cached);
                            continue;
                        }
                    }
                }

                let effective_mode = inst.pinned_mode.unwrap_or(mode);
                tracing::debug!(
                    "▶️ Step '{}' ({}/{}) in {} mode",
                    step_id,
                    inst.tracker.current_step(),
                    inst.tracker.total(),
                    effective_mode
                );
                let max_retries = step
                    .max_retries
                    .unwrap_or(self.config.execution.default_step_retries);
                Prepared {
                    ctx: StepContext::new(
                        step_id,
                        inst.id.clone(),
                        0,
                        inst.context.clone(),
                        effective_mode,
                        inst.status_tx.subscribe(),
                    ),
                    step,
                    max_retries,
                }
            };

            let started = Instant::now();
            let outcome = self
                .run_with_retries(&instance_id, &prepared.step, prepared.ctx, prepared.max_retries)
                .await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let step = prepared.step;

            let throttle = {
                let mut state = self.lock_state();
                let mode = self.auto_mode();
                let Some(inst) = state.current.as_mut().filter(|i| i.id == instance_id) else {
                    return;
                };
                match outcome {
                    Ok(out) => {
                        if let Err(e) = inst.tracker.mark_completed(&step.id, &out, elapsed_ms) {
                            tracing::warn!("⚠️ Step tracker out of sync for '{}': {}", step.id, e);
                        }
                        if let Some(key) = &step.cache_key {
                            if self.config.cache.enabled {
                                self.lock_cache().insert(key, out.output.clone());
                            }
                        }
                        inst.context.record_result(&step.id, out.output);
                    }
                    Err(e) => {
                        let message = match e {
                            YyFlowError::StepExecutionFailed { message, .. } => message,
                            other => other.to_string(),
                        };
                        tracing::warn!("⚠️ Step '{}' failed: {}", step.id, message);
                        if let Err(e) = inst.tracker.mark_failed(&step.id, &message, elapsed_ms) {
                            tracing::warn!("⚠️ Step tracker out of sync for '{}': {}", step.id, e);
                        }
                        if inst.status() == WorkflowStatus::Running {
                            inst.driving = false;
                            let failed_now = inst.fail(message);
                            let haptics = inst.haptics;
                            drop(state);
                            self.signal(haptics, failed_now.then_some(FeedbackIntensity::Heavy));
                            return;
                        }
                    }
                }

                let more = inst.tracker.first_unfinished().is_some();
                let effective_mode = inst.pinned_mode.unwrap_or(mode);
                if more && self.admission.should_optimize_performance(&self.device.snapshot()) {
                    tracing::debug!("🪫 Device under pressure, consider pausing '{}'", inst.definition.name);
                }
                let throttle = more
                    && effective_mode == PerformanceMode::PowerSave
                    && self.config.execution.power_save_step_delay_ms > 0;
                if throttle {
                    let note = format!(
                        "power-save pause {}ms before next step",
                        self.config.execution.power_save_step_delay_ms
                    );
                    if let Err(e) = inst.tracker.log(&step.id, &note) {
                        tracing::warn!("⚠️ Step tracker out of sync for '{}': {}", step.id, e);
                    }
                }
                throttle
            };

            if throttle {
                tokio::time::sleep(Duration::from_millis(self.config.execution.power_save_step_delay_ms)).await;
            }
        }
    }

    async fn run_with_retries(
        &self,
        instance_id: &str,
        step: &WorkflowStep,
        mut ctx: StepContext,
        max_retries: u32,
    ) -> Result<StepOutcome> {
        loop {
            match step.executable.run(&ctx).await {
                Ok(out) => return Ok(out),
                Err(e) => {
                    if ctx.attempt >= max_retries || ctx.is_cancelled() {
                        return Err(e);
                    }
                    let mut state = self.lock_state();
                    let Some(inst) = state.current.as_mut().filter(|i| i.id == instance_id) else {
                        return Err(e);
                    };
                    if let Err(te) = inst.tracker.record_retry(&step.id, &e.to_string()) {
                        tracing::warn!("⚠️ Step tracker out of sync for '{}': {}", step.id, te);
                    }
                    ctx.attempt += 1;
                    tracing::info!("🔁 Retrying step '{}' (attempt {})", step.id, ctx.attempt + 1);
                }
            }
        }
    }
}

/// Builder for [`WorkflowController`].
pub struct ControllerBuilder {
    config: YyFlowConfig,
    device: DeviceStatus,
    device_info: Arc<dyn DeviceInfoProvider>,
    haptics: Arc<dyn HapticSink>,
    processor: Option<Arc<dyn OperationProcessor>>,
}

impl ControllerBuilder {
    pub fn device_status(mut self, status: DeviceStatus) -> Self {
        self.device = status;
        self
    }

    pub fn device_info(mut self, provider: Arc<dyn DeviceInfoProvider>) -> Self {
        self.device_info = provider;
        self
    }

    pub fn haptics(mut self, sink: Arc<dyn HapticSink>) -> Self {
        self.haptics = sink;
        self
    }

    pub fn processor(mut self, processor: Arc<dyn OperationProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn build(self) -> WorkflowController {
        let config = self.config;
        let inner = Inner {
            admission: AdmissionController::new(config.admission.clone()),
            device: DeviceMonitor::new(self.device),
            device_info: self.device_info,
            feedback: FeedbackSignaler::new(self.haptics, config.feedback.clone()),
            queue: OfflineQueue::new(config.queue.capacity),
            processor: self.processor,
            cache: Mutex::new(ResultCache::new(config.cache.capacity)),
            state: Mutex::new(ControllerState::default()),
            config,
        };
        WorkflowController {
            inner: Arc::new(inner),
        }
    }
}

/// Cheap-to-clone handle on the controller.
#[derive(Clone)]
pub struct WorkflowController {
    inner: Arc<Inner>,
}

impl WorkflowController {
    pub fn new(config: YyFlowConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: YyFlowConfig) -> ControllerBuilder {
        ControllerBuilder {
            config,
            device: DeviceStatus::default(),
            device_info: Arc::new(DeviceInfo::default()),
            haptics: Arc::new(NoopHaptics),
            processor: None,
        }
    }

    pub fn config(&self) -> &YyFlowConfig {
        &self.inner.config
    }

    // ─── Lifecycle ────────────────────────────────────────────

    /// Admit and start a new instance, replacing any finished one.
    pub fn execute_workflow(
        &self,
        definition: WorkflowDefinition,
        options: ExecutionOptions,
    ) -> Result<WorkflowInstance> {
        definition.validate()?;
        let inner = &self.inner;
        let mut state = inner.lock_state();

        if let Some(active) = state.current.as_ref().filter(|i| i.status().is_active()) {
            tracing::warn!("⛔ Workflow '{}' rejected: {} still {}", definition.name, active.id, active.status());
            return Err(YyFlowError::AlreadyRunning(active.id.clone()));
        }

        let device = inner.device.snapshot();
        if !options.enable_offline_mode {
            let factors = inner.admission.blocking_factors(&device);
            if !factors.is_empty() {
                tracing::warn!("⛔ Workflow '{}' not admitted: {:?}", definition.name, factors);
                return Err(YyFlowError::AdmissionDenied { factors });
            }
        } else if !inner.admission.blocking_factors(&device).is_empty() {
            tracing::info!("📴 Workflow '{}' admitted via offline override", definition.name);
        }

        if options.auto_start {
            tokio::runtime::Handle::try_current()
                .map_err(|e| YyFlowError::Runtime(format!("no Tokio runtime to run steps on: {e}")))?;
        }

        let definition = Arc::new(definition);
        let tracker = StepTracker::new(definition.steps.iter().map(|s| (s.id.as_str(), s.name.as_str())));
        let context = ExecutionContext::new(
            options.variables,
            options.user,
            DeviceContext {
                info: inner.device_info.device_info(),
                status: device,
            },
            options.constraints,
        );
        let (status_tx, _rx) = watch::channel(WorkflowStatus::Idle);
        let mut instance = ActiveInstance {
            id: uuid::Uuid::new_v4().to_string(),
            definition,
            tracker,
            context,
            status_tx,
            started_at: Utc::now(),
            ended_at: None,
            result: None,
            error: None,
            pinned_mode: options.performance_mode,
            haptics: options.enable_haptic_feedback,
            driving: options.auto_start,
        };
        instance.transition(WorkflowStatus::Running);
        tracing::info!(
            "🚀 Workflow '{}' started: {} step(s), instance {}",
            instance.definition.name,
            instance.tracker.total(),
            instance.id
        );

        let id = instance.id.clone();
        let snapshot = instance.snapshot(inner.auto_mode());
        let haptics = instance.haptics;
        if let Some(previous) = state.current.replace(instance) {
            tracing::debug!("🗑️ Discarded previous instance {} ({})", previous.id, previous.status());
        }
        drop(state);

        inner.signal(haptics, Some(FeedbackIntensity::Medium));
        if options.auto_start {
            inner.spawn_driver(id)?;
        }
        Ok(snapshot)
    }

    /// Begin stepping an instance admitted with `auto_start = false`.
    pub fn start_workflow(&self) -> Result<bool> {
        let id = {
            let mut state = self.inner.lock_state();
            match state.current.as_mut() {
                Some(inst) if inst.status() == WorkflowStatus::Running && !inst.driving => {
                    inst.driving = true;
                    inst.id.clone()
                }
                _ => return Ok(false),
            }
        };
        if let Err(e) = self.inner.spawn_driver(id) {
            if let Some(inst) = self.inner.lock_state().current.as_mut() {
                inst.driving = false;
            }
            return Err(e);
        }
        Ok(true)
    }

    /// running → paused. No-op from any other state.
    pub fn pause_workflow(&self) -> bool {
        let mut state = self.inner.lock_state();
        let Some(inst) = state.current.as_mut() else { return false };
        if inst.status() != WorkflowStatus::Running || !inst.transition(WorkflowStatus::Paused) {
            return false;
        }
        let haptics = inst.haptics;
        drop(state);
        self.inner.signal(haptics, Some(FeedbackIntensity::Light));
        true
    }

    /// paused → running, continuing from the first unfinished step. No-op otherwise.
    pub fn resume_workflow(&self) -> bool {
        let mut state = self.inner.lock_state();
        let Some(inst) = state.current.as_mut() else { return false };
        if inst.status() != WorkflowStatus::Paused || !inst.transition(WorkflowStatus::Running) {
            return false;
        }
        let haptics = inst.haptics;
        let relaunch = if inst.driving {
            None
        } else {
            inst.driving = true;
            Some(inst.id.clone())
        };
        drop(state);

        self.inner.signal(haptics, Some(FeedbackIntensity::Medium));
        if let Some(id) = relaunch {
            if let Err(e) = self.inner.spawn_driver(id) {
                tracing::warn!("⚠️ Resumed without a driver: {e}");
                if let Some(inst) = self.inner.lock_state().current.as_mut() {
                    inst.driving = false;
                }
            }
        }
        true
    }

    /// running/paused → cancelled. In-flight steps are not interrupted.
    pub fn stop_workflow(&self) -> bool {
        let mut state = self.inner.lock_state();
        let Some(inst) = state.current.as_mut() else { return false };
        if !inst.status().is_active() || !inst.transition(WorkflowStatus::Cancelled) {
            return false;
        }
        let haptics = inst.haptics;
        drop(state);
        self.inner.signal(haptics, Some(FeedbackIntensity::Heavy));
        true
    }

    /// Resolve once the current instance is paused or terminal.
    pub async fn wait(&self) -> Option<WorkflowInstance> {
        let mut rx = self.subscribe_status()?;
        loop {
            let status = *rx.borrow_and_update();
            if status.is_terminal() || status == WorkflowStatus::Paused {
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
        self.instance()
    }

    /// Resolve once the current instance reaches a terminal state.
    pub async fn wait_for_terminal(&self) -> Option<WorkflowInstance> {
        let mut rx = self.subscribe_status()?;
        loop {
            if rx.borrow_and_update().is_terminal() {
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
        self.instance()
    }

    // ─── Device status & admission ────────────────────────────

    /// Merge a partial device sample and re-evaluate admission.
    pub fn update_device_status(&self, update: DeviceStatusUpdate) -> AdmissionDecision {
        let inner = &self.inner;
        let (previous, current) = inner.device.apply(&update);
        let old_mode = inner.admission.performance_mode(&previous);
        let new_mode = inner.admission.performance_mode(&current);
        if old_mode != new_mode {
            tracing::info!("⚙️ Performance mode: {} → {}", old_mode, new_mode);
        }
        if previous.is_online() != current.is_online() {
            if current.is_online() {
                tracing::info!("📶 Network back ({}), {} queued operation(s)", current.network_quality, inner.queue.len());
            } else {
                tracing::info!("📴 Network offline, operations will be queued");
            }
        }
        let decision = self.admission();
        if decision.should_optimize_performance && self.status() == WorkflowStatus::Running {
            tracing::debug!("🪫 Device under pressure while a workflow is running");
        }
        decision
    }

    pub fn device_status(&self) -> DeviceStatus {
        self.inner.device.snapshot()
    }

    pub fn subscribe_device(&self) -> watch::Receiver<DeviceStatus> {
        self.inner.device.subscribe()
    }

    pub fn admission(&self) -> AdmissionDecision {
        self.inner.admission.evaluate(self.status(), &self.inner.device.snapshot())
    }

    pub fn can_execute(&self) -> bool {
        self.inner.admission.can_execute(self.status())
    }

    pub fn can_execute_workflow(&self) -> bool {
        self.inner
            .admission
            .can_execute_workflow(self.status(), &self.inner.device.snapshot())
    }

    pub fn should_optimize_performance(&self) -> bool {
        self.inner
            .admission
            .should_optimize_performance(&self.inner.device.snapshot())
    }

    /// Pinned mode of the active instance, else derived from the device.
    pub fn performance_mode(&self) -> PerformanceMode {
        let state = self.inner.lock_state();
        state
            .current
            .as_ref()
            .filter(|i| i.status().is_active())
            .and_then(|i| i.pinned_mode)
            .unwrap_or_else(|| self.inner.auto_mode())
    }

    // ─── Observers ────────────────────────────────────────────

    /// Idle when no instance exists.
    pub fn status(&self) -> WorkflowStatus {
        self.inner
            .lock_state()
            .current
            .as_ref()
            .map(|i| i.status())
            .unwrap_or_default()
    }

    pub fn instance(&self) -> Option<WorkflowInstance> {
        let mode = self.inner.auto_mode();
        self.inner
            .lock_state()
            .current
            .as_ref()
            .map(|i| i.snapshot(mode))
    }

    pub fn step_states(&self) -> HashMap<String, StepState> {
        self.inner
            .lock_state()
            .current
            .as_ref()
            .map(|i| i.tracker.as_map().clone())
            .unwrap_or_default()
    }

    pub fn progress_percentage(&self) -> u8 {
        self.inner
            .lock_state()
            .current
            .as_ref()
            .map(|i| i.tracker.progress_percentage())
            .unwrap_or(0)
    }

    /// Average completed-step time × remaining steps.
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let state = self.inner.lock_state();
        let inst = state.current.as_ref()?;
        let avg = inst.tracker.average_step_ms()?;
        let remaining = inst.tracker.total() - inst.tracker.completed_count();
        Some(Duration::from_millis(avg * remaining as u64))
    }

    pub fn subscribe_status(&self) -> Option<watch::Receiver<WorkflowStatus>> {
        self.inner
            .lock_state()
            .current
            .as_ref()
            .map(|i| i.status_tx.subscribe())
    }

    // ─── Offline queue ────────────────────────────────────────

    pub fn add_to_offline_queue(&self, operation: OfflineOperation) -> String {
        self.inner.queue.enqueue(operation)
    }

    /// Drain with the configured processor. No-op without one.
    pub async fn process_offline_queue(&self) -> DrainReport {
        match self.inner.processor.clone() {
            Some(processor) => self.process_offline_queue_with(processor.as_ref()).await,
            None => {
                tracing::warn!("⚠️ No offline processor configured, {} operation(s) left queued", self.inner.queue.len());
                DrainReport::default()
            }
        }
    }

    pub async fn process_offline_queue_with(&self, processor: &dyn OperationProcessor) -> DrainReport {
        let network = self.inner.device.snapshot().network_quality;
        self.inner.queue.drain(network, processor).await
    }

    /// Apply now when online, otherwise (or on failure) defer to the queue.
    pub async fn submit_operation(&self, operation: OfflineOperation) -> Submission {
        let online = self.inner.device.snapshot().is_online();
        if let (true, Some(processor)) = (online, self.inner.processor.clone()) {
            match processor.process(&operation).await {
                Ok(()) => return Submission::Applied,
                Err(e) => tracing::warn!("⚠️ Operation '{}' failed, queued for replay: {}", operation.kind, e),
            }
        }
        Submission::Queued(self.inner.queue.enqueue(operation))
    }

    pub fn offline_queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn offline_queue(&self) -> &OfflineQueue {
        &self.inner.queue
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.inner.queue.stats()
    }

    // ─── Result cache ─────────────────────────────────────────

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.lock_cache().stats()
    }

    pub fn clear_cache(&self) {
        self.inner.lock_cache().clear();
    }
}
