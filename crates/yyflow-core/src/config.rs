//! yyflow configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, YyFlowError};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YyFlowConfig {
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl YyFlowConfig {
    /// Load config from the default path (~/.yyflow/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| YyFlowError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| YyFlowError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| YyFlowError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the yyflow home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".yyflow")
    }
}

/// Device thresholds for admission, load shedding and performance mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Battery must be strictly above this to admit a run.
    #[serde(default = "default_min_battery")]
    pub min_battery: f64,
    /// Memory must be strictly below this to admit a run.
    #[serde(default = "default_max_memory")]
    pub max_memory: f64,
    /// CPU must be strictly below this to admit a run.
    #[serde(default = "default_max_cpu")]
    pub max_cpu: f64,
    #[serde(default = "default_optimize_battery_below")]
    pub optimize_battery_below: f64,
    #[serde(default = "default_optimize_memory_above")]
    pub optimize_memory_above: f64,
    #[serde(default = "default_optimize_cpu_above")]
    pub optimize_cpu_above: f64,
    #[serde(default = "default_power_save_battery_below")]
    pub power_save_battery_below: f64,
    #[serde(default = "default_power_save_memory_above")]
    pub power_save_memory_above: f64,
    #[serde(default = "default_high_performance_battery_above")]
    pub high_performance_battery_above: f64,
    #[serde(default = "default_high_performance_memory_below")]
    pub high_performance_memory_below: f64,
}

fn default_min_battery() -> f64 { 0.1 }
fn default_max_memory() -> f64 { 0.8 }
fn default_max_cpu() -> f64 { 0.7 }
fn default_optimize_battery_below() -> f64 { 0.3 }
fn default_optimize_memory_above() -> f64 { 0.7 }
fn default_optimize_cpu_above() -> f64 { 0.6 }
fn default_power_save_battery_below() -> f64 { 0.2 }
fn default_power_save_memory_above() -> f64 { 0.8 }
fn default_high_performance_battery_above() -> f64 { 0.8 }
fn default_high_performance_memory_below() -> f64 { 0.5 }

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            min_battery: default_min_battery(),
            max_memory: default_max_memory(),
            max_cpu: default_max_cpu(),
            optimize_battery_below: default_optimize_battery_below(),
            optimize_memory_above: default_optimize_memory_above(),
            optimize_cpu_above: default_optimize_cpu_above(),
            power_save_battery_below: default_power_save_battery_below(),
            power_save_memory_above: default_power_save_memory_above(),
            high_performance_battery_above: default_high_performance_battery_above(),
            high_performance_memory_below: default_high_performance_memory_below(),
        }
    }
}

/// Offline queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Max queued operations; oldest entries are evicted beyond this. 0 = unbounded.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
    /// Periodic drain interval for the connectivity watcher.
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
}

fn default_queue_capacity() -> usize { 500 }
fn default_drain_interval_secs() -> u64 { 30 }

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            drain_interval_secs: default_drain_interval_secs(),
        }
    }
}

/// Step result cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn bool_true() -> bool { true }
fn default_cache_capacity() -> usize { 128 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
        }
    }
}

/// Haptic feedback patterns (milliseconds of vibration / pause, alternating).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_light_pattern")]
    pub light: Vec<u64>,
    #[serde(default = "default_medium_pattern")]
    pub medium: Vec<u64>,
    #[serde(default = "default_heavy_pattern")]
    pub heavy: Vec<u64>,
}

fn default_light_pattern() -> Vec<u64> { vec![10] }
fn default_medium_pattern() -> Vec<u64> { vec![20] }
fn default_heavy_pattern() -> Vec<u64> { vec![30, 10, 30] }

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            light: default_light_pattern(),
            medium: default_medium_pattern(),
            heavy: default_heavy_pattern(),
        }
    }
}

/// Step execution tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Delay inserted between steps while in power-save mode.
    #[serde(default = "default_power_save_delay_ms")]
    pub power_save_step_delay_ms: u64,
    /// In-place retries for steps that do not set their own budget.
    #[serde(default)]
    pub default_step_retries: u32,
}

fn default_power_save_delay_ms() -> u64 { 250 }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            power_save_step_delay_ms: default_power_save_delay_ms(),
            default_step_retries: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = YyFlowConfig::from_toml("").unwrap();
        assert_eq!(config, YyFlowConfig::default());
        assert_eq!(config.admission.min_battery, 0.1);
        assert_eq!(config.feedback.heavy, vec![30, 10, 30]);
    }

    #[test]
    fn test_partial_section_override() {
        let config = YyFlowConfig::from_toml(
            "[admission]\nmax_cpu = 0.9\n\n[queue]\ncapacity = 0\n",
        )
        .unwrap();
        assert_eq!(config.admission.max_cpu, 0.9);
        assert_eq!(config.admission.max_memory, 0.8);
        assert_eq!(config.queue.capacity, 0);
        assert_eq!(config.queue.drain_interval_secs, 30);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("yyflow-test-config");
        let path = dir.join("config.toml");
        let mut config = YyFlowConfig::default();
        config.cache.capacity = 7;
        config.save_to(&path).unwrap();
        let loaded = YyFlowConfig::load_from(&path).unwrap();
        assert_eq!(loaded.cache.capacity, 7);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = YyFlowConfig::from_toml("[queue]\ncapacity = \"lots\"").unwrap_err();
        assert!(matches!(err, YyFlowError::Config(_)));
    }
}
