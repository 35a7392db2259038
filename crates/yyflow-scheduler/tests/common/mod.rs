#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use yyflow_core::YyFlowConfig;
use yyflow_core::YyFlowError;
use yyflow_core::traits::{HapticSink, StepOutcome};
use yyflow_core::types::{DeviceStatus, NetworkQuality};
use yyflow_scheduler::{WorkflowController, WorkflowDefinition, WorkflowStep, step_fn};

pub fn healthy() -> DeviceStatus {
    DeviceStatus::new(0.5, NetworkQuality::Good, 0.3, 0.2)
}

pub fn controller_with(device: DeviceStatus) -> WorkflowController {
    WorkflowController::builder(YyFlowConfig::default())
        .device_status(device)
        .build()
}

/// Steps that finish immediately with their 1-based index.
pub fn instant_workflow(n: usize) -> WorkflowDefinition {
    let mut def = WorkflowDefinition::new("instant", "Instant");
    for i in 1..=n {
        def = def.step(WorkflowStep::new(
            format!("s{i}"),
            step_fn(move |_ctx| async move { Ok(StepOutcome::new(serde_json::json!(i))) }),
        ));
    }
    def
}

/// Steps that each wait for one permit on `gate`.
pub fn gated_workflow(n: usize, gate: Arc<Semaphore>) -> WorkflowDefinition {
    let mut def = WorkflowDefinition::new("gated", "Gated");
    for i in 1..=n {
        let gate = gate.clone();
        def = def.step(WorkflowStep::new(
            format!("s{i}"),
            step_fn(move |_ctx| {
                let gate = gate.clone();
                async move {
                    gate.acquire()
                        .await
                        .map_err(|e| YyFlowError::Other(e.to_string()))?
                        .forget();
                    Ok(StepOutcome::new(serde_json::json!(i)))
                }
            }),
        ));
    }
    def
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

/// Haptic sink that remembers every pattern it was asked to play.
#[derive(Default)]
pub struct RecordingHaptics {
    pub patterns: Mutex<Vec<Vec<u64>>>,
}

impl RecordingHaptics {
    pub fn played(&self) -> Vec<Vec<u64>> {
        self.patterns.lock().unwrap().clone()
    }
}

impl HapticSink for RecordingHaptics {
    fn vibrate(&self, pattern: &[u64]) -> Result<(), String> {
        self.patterns.lock().unwrap().push(pattern.to_vec());
        Ok(())
    }
}
