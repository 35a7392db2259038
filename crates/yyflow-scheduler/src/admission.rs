//! Admission Controller: decides whether new work may start.
//!
//! Pure functions over a `DeviceStatus` snapshot and the current lifecycle
//! status. No hidden state: the same inputs always give the same answer.
//!
//! ```text
//! can_execute_workflow = no active instance
//!                        && network != offline
//!                        && battery > min_battery
//!                        && memory  < max_memory
//!                        && cpu     < max_cpu
//! ```

use serde::Serialize;
use yyflow_core::config::AdmissionConfig;
use yyflow_core::types::{BlockingFactor, DeviceStatus, NetworkQuality, PerformanceMode, WorkflowStatus};

/// Result of evaluating device conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionDecision {
    /// No instance occupies the single slot.
    pub can_execute: bool,
    /// `can_execute` and every device check passes.
    pub can_execute_workflow: bool,
    pub should_optimize_performance: bool,
    pub performance_mode: PerformanceMode,
    /// Every device check that failed, for diagnostics.
    pub blocking: Vec<BlockingFactor>,
}

#[derive(Debug, Clone, Default)]
pub struct AdmissionController {
    thresholds: AdmissionConfig,
}

impl AdmissionController {
    pub fn new(thresholds: AdmissionConfig) -> Self {
        Self { thresholds }
    }

    /// Single-instance rule.
    pub fn can_execute(&self, lifecycle: WorkflowStatus) -> bool {
        !lifecycle.is_active()
    }

    /// Device checks that block admission (empty = device is fine).
    pub fn blocking_factors(&self, device: &DeviceStatus) -> Vec<BlockingFactor> {
        let t = &self.thresholds;
        let mut factors = Vec::new();
        if device.network_quality.is_offline() {
            factors.push(BlockingFactor::Offline);
        }
        if device.battery_level <= t.min_battery {
            factors.push(BlockingFactor::LowBattery {
                level: device.battery_level,
                minimum: t.min_battery,
            });
        }
        if device.memory_usage >= t.max_memory {
            factors.push(BlockingFactor::MemoryPressure {
                usage: device.memory_usage,
                limit: t.max_memory,
            });
        }
        if device.cpu_usage >= t.max_cpu {
            factors.push(BlockingFactor::CpuPressure {
                usage: device.cpu_usage,
                limit: t.max_cpu,
            });
        }
        factors
    }

    pub fn can_execute_workflow(&self, lifecycle: WorkflowStatus, device: &DeviceStatus) -> bool {
        self.can_execute(lifecycle) && self.blocking_factors(device).is_empty()
    }

    /// Advisory: the device is under enough pressure to shed load.
    pub fn should_optimize_performance(&self, device: &DeviceStatus) -> bool {
        let t = &self.thresholds;
        device.battery_level < t.optimize_battery_below
            || device.memory_usage > t.optimize_memory_above
            || device.cpu_usage > t.optimize_cpu_above
            || device.network_quality == NetworkQuality::Poor
    }

    /// Power-save wins over high-performance when both could apply.
    pub fn performance_mode(&self, device: &DeviceStatus) -> PerformanceMode {
        let t = &self.thresholds;
        if device.battery_level < t.power_save_battery_below
            || device.memory_usage > t.power_save_memory_above
        {
            PerformanceMode::PowerSave
        } else if device.battery_level > t.high_performance_battery_above
            && device.memory_usage < t.high_performance_memory_below
            && device.network_quality == NetworkQuality::Excellent
        {
            PerformanceMode::HighPerformance
        } else {
            PerformanceMode::Normal
        }
    }

    /// Full evaluation in one pass.
    pub fn evaluate(&self, lifecycle: WorkflowStatus, device: &DeviceStatus) -> AdmissionDecision {
        let blocking = self.blocking_factors(device);
        let can_execute = self.can_execute(lifecycle);
        AdmissionDecision {
            can_execute,
            can_execute_workflow: can_execute && blocking.is_empty(),
            should_optimize_performance: self.should_optimize_performance(device),
            performance_mode: self.performance_mode(device),
            blocking,
        }
    }
}
