//! # YYFlow Scheduler
//!
//! Execution controller for multi-step workflows on phones and tablets.
//! One workflow instance runs at a time, gated by battery, memory, CPU and
//! network conditions.
//!
//! ## Design Principles (for battery-powered devices)
//! - Single active instance: no contention between workflows
//! - Cooperative pause/stop at step boundaries
//! - Offline operations queued in memory, replayed when the network returns
//! - Tokio tasks only: nothing runs while idle
//!
//! ## Architecture
//! ```text
//! DeviceMonitor (watch channel)
//!   ├── AdmissionController → can run? performance mode?
//!   └── connectivity watcher → OfflineQueue::drain on reconnect
//!
//! WorkflowController
//!   ├── execute_workflow → admit → spawn driver
//!   ├── driver: step 1 → step 2 → … (StepTracker, ResultCache)
//!   ├── pause / resume / stop → FeedbackSignaler (light / medium / heavy)
//!   └── submit_operation → processor or OfflineQueue
//! ```

pub mod admission;
pub mod cache;
pub mod controller;
pub mod device;
pub mod feedback;
pub mod offline;
pub mod steps;
pub mod watcher;
pub mod workflow;

pub use admission::{AdmissionController, AdmissionDecision};
pub use cache::{CacheStats, ResultCache};
pub use controller::{ControllerBuilder, Submission, WorkflowController};
pub use device::DeviceMonitor;
pub use feedback::{FeedbackIntensity, FeedbackSignaler};
pub use offline::{DrainReport, OfflineEntry, OfflineQueue, QueueStats};
pub use steps::{StepLogEntry, StepMetrics, StepState, StepStatus, StepTracker};
pub use watcher::spawn_connectivity_watcher;
pub use workflow::{
    ExecutionOptions, WorkflowDefinition, WorkflowInstance, WorkflowStep, step_fn,
};
