//! Shared data model: device status, lifecycle status, execution context.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Network quality classification reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkQuality {
    Excellent,
    #[default]
    Good,
    Poor,
    Offline,
}

impl NetworkQuality {
    pub fn is_offline(&self) -> bool {
        matches!(self, NetworkQuality::Offline)
    }
}

impl fmt::Display for NetworkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkQuality::Excellent => write!(f, "excellent"),
            NetworkQuality::Good => write!(f, "good"),
            NetworkQuality::Poor => write!(f, "poor"),
            NetworkQuality::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for NetworkQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "excellent" => Ok(NetworkQuality::Excellent),
            "good" => Ok(NetworkQuality::Good),
            "poor" => Ok(NetworkQuality::Poor),
            "offline" => Ok(NetworkQuality::Offline),
            other => Err(format!("unknown network quality '{other}'")),
        }
    }
}

/// Latest observed device sample. Only the most recent value matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Battery level in [0, 1].
    pub battery_level: f64,
    pub network_quality: NetworkQuality,
    /// Memory utilization in [0, 1].
    pub memory_usage: f64,
    /// CPU utilization in [0, 1].
    pub cpu_usage: f64,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            battery_level: 1.0,
            network_quality: NetworkQuality::Good,
            memory_usage: 0.0,
            cpu_usage: 0.0,
        }
    }
}

impl DeviceStatus {
    pub fn new(battery_level: f64, network_quality: NetworkQuality, memory_usage: f64, cpu_usage: f64) -> Self {
        Self {
            battery_level: clamp_unit(battery_level),
            network_quality,
            memory_usage: clamp_unit(memory_usage),
            cpu_usage: clamp_unit(cpu_usage),
        }
    }

    /// Apply a partial update, returning the merged snapshot.
    pub fn merged(&self, update: &DeviceStatusUpdate) -> Self {
        Self {
            battery_level: update.battery_level.map(clamp_unit).unwrap_or(self.battery_level),
            network_quality: update.network_quality.unwrap_or(self.network_quality),
            memory_usage: update.memory_usage.map(clamp_unit).unwrap_or(self.memory_usage),
            cpu_usage: update.cpu_usage.map(clamp_unit).unwrap_or(self.cpu_usage),
        }
    }

    pub fn is_online(&self) -> bool {
        !self.network_quality.is_offline()
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Partial device status update; absent fields keep their previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatusUpdate {
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub network_quality: Option<NetworkQuality>,
    #[serde(default)]
    pub memory_usage: Option<f64>,
    #[serde(default)]
    pub cpu_usage: Option<f64>,
}

impl DeviceStatusUpdate {
    pub fn battery(level: f64) -> Self {
        Self { battery_level: Some(level), ..Default::default() }
    }

    pub fn network(quality: NetworkQuality) -> Self {
        Self { network_quality: Some(quality), ..Default::default() }
    }

    pub fn memory(usage: f64) -> Self {
        Self { memory_usage: Some(usage), ..Default::default() }
    }

    pub fn cpu(usage: f64) -> Self {
        Self { cpu_usage: Some(usage), ..Default::default() }
    }
}

/// Advisory execution profile derived from device conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    #[default]
    Normal,
    PowerSave,
    HighPerformance,
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceMode::Normal => write!(f, "normal"),
            PerformanceMode::PowerSave => write!(f, "power_save"),
            PerformanceMode::HighPerformance => write!(f, "high_performance"),
        }
    }
}

/// A single reason admission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "factor", rename_all = "snake_case")]
pub enum BlockingFactor {
    Offline,
    LowBattery { level: f64, minimum: f64 },
    MemoryPressure { usage: f64, limit: f64 },
    CpuPressure { usage: f64, limit: f64 },
}

fn pct(v: f64) -> u32 {
    (v * 100.0).round() as u32
}

impl fmt::Display for BlockingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockingFactor::Offline => write!(f, "network offline"),
            BlockingFactor::LowBattery { level, minimum } => {
                write!(f, "battery {}% at or below {}% minimum", pct(*level), pct(*minimum))
            }
            BlockingFactor::MemoryPressure { usage, limit } => {
                write!(f, "memory {}% at or above {}% limit", pct(*usage), pct(*limit))
            }
            BlockingFactor::CpuPressure { usage, limit } => {
                write!(f, "cpu {}% at or above {}% limit", pct(*usage), pct(*limit))
            }
        }
    }
}

/// Lifecycle status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// No instance exists yet.
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }

    /// Running or paused; occupies the single instance slot.
    pub fn is_active(&self) -> bool {
        matches!(self, WorkflowStatus::Running | WorkflowStatus::Paused)
    }

    /// Whether `self → next` is an edge of the lifecycle state machine.
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Paused, Cancelled)
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStatus::Idle => "idle",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Paused => "paused",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Who the workflow runs for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Preference flags (e.g. "reduce_motion", "quiet_mode").
    #[serde(default)]
    pub preferences: HashMap<String, bool>,
}

/// Static platform metadata from the device-context provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub screen_width: u32,
    #[serde(default)]
    pub screen_height: u32,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            os_version: None,
            user_agent: None,
            screen_width: 0,
            screen_height: 0,
        }
    }
}

/// Device snapshot captured when the instance starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceContext {
    pub info: DeviceInfo,
    pub status: DeviceStatus,
}

/// Limits threaded through to step executors. The controller never enforces them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConstraints {
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub max_network_calls: Option<u32>,
}

/// Per-instance execution context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    step_results: HashMap<String, serde_json::Value>,
    pub variables: HashMap<String, serde_json::Value>,
    pub user: UserContext,
    pub device: DeviceContext,
    pub constraints: ExecutionConstraints,
}

impl ExecutionContext {
    pub fn new(
        variables: HashMap<String, serde_json::Value>,
        user: UserContext,
        device: DeviceContext,
        constraints: ExecutionConstraints,
    ) -> Self {
        Self {
            step_results: HashMap::new(),
            variables,
            user,
            device,
            constraints,
        }
    }

    /// Record a step result. Write-once: returns false if the step already has one.
    pub fn record_result(&mut self, step_id: &str, value: serde_json::Value) -> bool {
        if self.step_results.contains_key(step_id) {
            return false;
        }
        self.step_results.insert(step_id.to_string(), value);
        true
    }

    pub fn result(&self, step_id: &str) -> Option<&serde_json::Value> {
        self.step_results.get(step_id)
    }

    pub fn results(&self) -> &HashMap<String, serde_json::Value> {
        &self.step_results
    }

    pub fn variable(&self, name: &str) -> Option<&serde_json::Value> {
        self.variables.get(name)
    }
}
