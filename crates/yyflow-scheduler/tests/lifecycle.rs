//! Lifecycle invariants: single instance, idempotent controls, progress, feedback.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::*;
use tokio::sync::Semaphore;
use yyflow_core::YyFlowConfig;
use yyflow_core::YyFlowError;
use yyflow_core::traits::StepOutcome;
use yyflow_core::types::{
    BlockingFactor, DeviceStatusUpdate, ExecutionConstraints, NetworkQuality, PerformanceMode, WorkflowStatus,
};
use yyflow_scheduler::{
    ExecutionOptions, StepStatus, WorkflowController, WorkflowDefinition, WorkflowStep, step_fn,
};

#[tokio::test]
async fn only_one_instance_active() {
    let controller = controller_with(healthy());
    let gate = Arc::new(Semaphore::new(0));
    let first = controller
        .execute_workflow(gated_workflow(2, gate.clone()), ExecutionOptions::default())
        .unwrap();

    let err = controller
        .execute_workflow(instant_workflow(1), ExecutionOptions::default())
        .unwrap_err();
    assert!(matches!(err, YyFlowError::AlreadyRunning(ref id) if *id == first.id));

    // Paused still occupies the slot.
    controller.pause_workflow();
    assert!(matches!(
        controller.execute_workflow(instant_workflow(1), ExecutionOptions::offline()),
        Err(YyFlowError::AlreadyRunning(_))
    ));
    assert!(!controller.can_execute());

    // Cancelled frees it.
    controller.stop_workflow();
    assert!(controller.can_execute());
    let second = controller
        .execute_workflow(instant_workflow(1), ExecutionOptions::default())
        .unwrap();
    assert_ne!(second.id, first.id);
    assert_eq!(controller.wait().await.unwrap().status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn controls_are_idempotent() {
    let controller = controller_with(healthy());
    let gate = Arc::new(Semaphore::new(0));
    controller
        .execute_workflow(gated_workflow(2, gate), ExecutionOptions::default())
        .unwrap();

    assert!(controller.pause_workflow());
    assert!(!controller.pause_workflow());
    assert_eq!(controller.status(), WorkflowStatus::Paused);

    assert!(controller.resume_workflow());
    assert!(!controller.resume_workflow());
    assert_eq!(controller.status(), WorkflowStatus::Running);

    assert!(controller.stop_workflow());
    assert!(!controller.stop_workflow());
    assert_eq!(controller.status(), WorkflowStatus::Cancelled);
}

#[tokio::test]
async fn terminal_states_are_final() {
    let controller = controller_with(healthy());
    assert!(!controller.pause_workflow());
    assert!(!controller.resume_workflow());
    assert!(!controller.stop_workflow());
    assert_eq!(controller.status(), WorkflowStatus::Idle);

    controller
        .execute_workflow(instant_workflow(2), ExecutionOptions::default())
        .unwrap();
    let done = controller.wait().await.unwrap();
    assert_eq!(done.status, WorkflowStatus::Completed);

    assert!(!controller.pause_workflow());
    assert!(!controller.resume_workflow());
    assert!(!controller.stop_workflow());
    let after = controller.instance().unwrap();
    assert_eq!(after.status, WorkflowStatus::Completed);
    assert_eq!(after.ended_at, done.ended_at);
}

#[tokio::test]
async fn progress_tracks_completed_steps() {
    let controller = controller_with(healthy());
    let gate = Arc::new(Semaphore::new(0));
    controller
        .execute_workflow(gated_workflow(3, gate.clone()), ExecutionOptions::default())
        .unwrap();

    let expected = [(1, 33u8), (2, 67), (3, 100)];
    for (i, (pointer, pct)) in expected.into_iter().enumerate() {
        let inst = controller.instance().unwrap();
        assert_eq!(inst.completed_steps, i);
        assert_eq!(inst.current_step, pointer);
        assert_eq!(inst.progress_percentage, pct);
        assert_eq!(controller.progress_percentage(), pct);
        assert!(inst.completed_steps <= inst.total_steps);

        gate.add_permits(1);
        eventually("next step completed", || {
            controller.instance().map(|i| i.completed_steps) == Some(pointer)
        })
        .await;
    }
    let done = controller.wait().await.unwrap();
    assert_eq!(done.current_step, 3);
    assert_eq!(done.progress_percentage, 100);
    assert!(controller.estimated_remaining().is_some());
}

#[tokio::test]
async fn step_failure_while_paused_fails_on_resume() {
    let controller = controller_with(healthy());
    let gate = Arc::new(Semaphore::new(0));
    let held = gate.clone();
    let def = WorkflowDefinition::new("sync", "Sync")
        .step(WorkflowStep::new(
            "upload",
            step_fn(move |ctx| {
                let held = held.clone();
                async move {
                    let _permit = held.acquire().await.map_err(|e| YyFlowError::Other(e.to_string()))?;
                    Err::<StepOutcome, _>(YyFlowError::step(ctx.step_id, "quota exceeded"))
                }
            }),
        ))
        .step(WorkflowStep::new("notify", step_fn(|_| async { Ok(StepOutcome::default()) })));
    controller.execute_workflow(def, ExecutionOptions::default()).unwrap();

    eventually("upload running", || {
        controller.step_states()["upload"].status == StepStatus::Running
    })
    .await;
    controller.pause_workflow();
    gate.add_permits(1);
    eventually("upload failed", || {
        controller.step_states()["upload"].status == StepStatus::Failed
    })
    .await;
    assert_eq!(controller.status(), WorkflowStatus::Paused);

    controller.resume_workflow();
    let done = controller.wait().await.unwrap();
    assert_eq!(done.status, WorkflowStatus::Failed);
    assert_eq!(done.error.as_deref(), Some("quota exceeded"));
    assert_eq!(done.step("notify").unwrap().status, StepStatus::Pending);
}

#[tokio::test]
async fn stop_lets_in_flight_step_finish_but_runs_nothing_else() {
    let controller = controller_with(healthy());
    let gate = Arc::new(Semaphore::new(0));
    controller
        .execute_workflow(gated_workflow(2, gate.clone()), ExecutionOptions::default())
        .unwrap();
    eventually("s1 running", || {
        controller.step_states()["s1"].status == StepStatus::Running
    })
    .await;

    controller.stop_workflow();
    gate.add_permits(2);
    eventually("s1 recorded", || {
        controller.step_states()["s1"].status == StepStatus::Completed
    })
    .await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let inst = controller.instance().unwrap();
    assert_eq!(inst.status, WorkflowStatus::Cancelled);
    assert_eq!(inst.step("s2").unwrap().status, StepStatus::Pending);
    assert!(inst.result.is_none());
}

#[tokio::test]
async fn feedback_follows_lifecycle() {
    let haptics = Arc::new(RecordingHaptics::default());
    let controller = WorkflowController::builder(YyFlowConfig::default())
        .device_status(healthy())
        .haptics(haptics.clone())
        .build();
    let gate = Arc::new(Semaphore::new(0));
    controller
        .execute_workflow(gated_workflow(2, gate), ExecutionOptions::default())
        .unwrap();
    controller.pause_workflow();
    controller.pause_workflow();
    controller.resume_workflow();
    controller.stop_workflow();
    controller.stop_workflow();

    assert_eq!(
        haptics.played(),
        vec![vec![20], vec![10], vec![20], vec![30, 10, 30]]
    );
}

#[tokio::test]
async fn feedback_can_be_disabled_per_run() {
    let haptics = Arc::new(RecordingHaptics::default());
    let controller = WorkflowController::builder(YyFlowConfig::default())
        .device_status(healthy())
        .haptics(haptics.clone())
        .build();
    let options = ExecutionOptions {
        enable_haptic_feedback: false,
        ..Default::default()
    };
    controller.execute_workflow(instant_workflow(2), options).unwrap();
    controller.wait().await.unwrap();
    assert!(haptics.played().is_empty());
}

#[tokio::test]
async fn completion_and_failure_signal() {
    let haptics = Arc::new(RecordingHaptics::default());
    let controller = WorkflowController::builder(YyFlowConfig::default())
        .device_status(healthy())
        .haptics(haptics.clone())
        .build();

    controller
        .execute_workflow(instant_workflow(1), ExecutionOptions::default())
        .unwrap();
    controller.wait().await.unwrap();
    // The completion cue fires just after the status flips.
    eventually("completion cue", || haptics.played().len() == 2).await;
    assert_eq!(haptics.played(), vec![vec![20], vec![20]]);

    let failing = WorkflowDefinition::new("bad", "Bad").step(WorkflowStep::new(
        "only",
        step_fn(|ctx| async move { Err::<StepOutcome, _>(YyFlowError::step(ctx.step_id, "nope")) }),
    ));
    controller.execute_workflow(failing, ExecutionOptions::default()).unwrap();
    controller.wait().await.unwrap();
    eventually("failure cue", || haptics.played().len() == 4).await;
    assert_eq!(haptics.played().last(), Some(&vec![30, 10, 30]));
}

#[tokio::test]
async fn device_updates_drive_performance_mode() {
    let controller = controller_with(healthy());
    assert_eq!(controller.performance_mode(), PerformanceMode::Normal);

    let decision = controller.update_device_status(DeviceStatusUpdate::battery(0.15));
    assert_eq!(decision.performance_mode, PerformanceMode::PowerSave);
    assert!(decision.should_optimize_performance);
    assert_eq!(controller.performance_mode(), PerformanceMode::PowerSave);

    // Same snapshot, same answer.
    assert_eq!(controller.admission(), controller.admission());

    controller.update_device_status(DeviceStatusUpdate {
        battery_level: Some(0.95),
        memory_usage: Some(0.2),
        network_quality: Some(NetworkQuality::Excellent),
        ..Default::default()
    });
    assert_eq!(controller.performance_mode(), PerformanceMode::HighPerformance);
    assert!(!controller.should_optimize_performance());

    let decision = controller.update_device_status(DeviceStatusUpdate::memory(0.85));
    assert_eq!(decision.performance_mode, PerformanceMode::PowerSave);
    assert!(matches!(decision.blocking[..], [BlockingFactor::MemoryPressure { .. }]));

    controller.update_device_status(DeviceStatusUpdate::memory(0.2));
    let decision = controller.update_device_status(DeviceStatusUpdate::cpu(0.75));
    // CPU blocks admission without changing the mode.
    assert_eq!(decision.performance_mode, PerformanceMode::HighPerformance);
    assert!(decision.should_optimize_performance);
    assert!(matches!(decision.blocking[..], [BlockingFactor::CpuPressure { .. }]));
    assert!(!decision.can_execute_workflow);
}

#[tokio::test]
async fn power_save_mode_still_completes() {
    let mut config = YyFlowConfig::default();
    config.execution.power_save_step_delay_ms = 5;
    let controller = WorkflowController::builder(config)
        .device_status(healthy())
        .build();
    let options = ExecutionOptions {
        performance_mode: Some(PerformanceMode::PowerSave),
        ..Default::default()
    };
    controller.execute_workflow(instant_workflow(3), options).unwrap();
    let done = controller.wait().await.unwrap();
    assert_eq!(done.status, WorkflowStatus::Completed);
    assert_eq!(done.performance_mode, PerformanceMode::PowerSave);
}

#[tokio::test]
async fn executor_sees_pause_cancel_constraints_and_start_snapshot() {
    let controller = controller_with(healthy());
    let seen = Arc::new(Mutex::new(None));
    let saw_pause = Arc::new(AtomicBool::new(false));
    let stopped_early = Arc::new(AtomicBool::new(false));

    let (seen_in, pause_in, stop_in) = (seen.clone(), saw_pause.clone(), stopped_early.clone());
    let def = WorkflowDefinition::new("export", "Export")
        .step(WorkflowStep::new(
            "chunks",
            step_fn(move |ctx| {
                let (seen, saw_pause, stopped) = (seen_in.clone(), pause_in.clone(), stop_in.clone());
                async move {
                    *seen.lock().unwrap() = Some((
                        ctx.timeout(),
                        ctx.context.device.status.battery_level,
                        ctx.context.variable("class").cloned(),
                    ));
                    let mut chunks = 0u32;
                    while !ctx.is_cancelled() {
                        if ctx.is_paused() {
                            saw_pause.store(true, Ordering::SeqCst);
                        }
                        chunks += 1;
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                    stopped.store(true, Ordering::SeqCst);
                    Ok(StepOutcome::new(serde_json::json!({ "chunks": chunks })))
                }
            }),
        ))
        .step(WorkflowStep::new("notify", step_fn(|_| async { Ok(StepOutcome::default()) })));

    let options = ExecutionOptions {
        variables: HashMap::from([("class".to_string(), serde_json::json!("3B"))]),
        constraints: ExecutionConstraints {
            timeout_seconds: Some(9),
            ..Default::default()
        },
        ..Default::default()
    };
    controller.execute_workflow(def, options).unwrap();
    // Later samples do not leak into the running instance's context.
    controller.update_device_status(DeviceStatusUpdate::battery(0.9));

    eventually("step observed its context", || seen.lock().unwrap().is_some()).await;
    let (timeout, battery, class) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(timeout, Some(Duration::from_secs(9)));
    assert_eq!(battery, 0.5);
    assert_eq!(class, Some(serde_json::json!("3B")));

    controller.pause_workflow();
    eventually("step saw the pause", || saw_pause.load(Ordering::SeqCst)).await;
    assert!(!stopped_early.load(Ordering::SeqCst));

    controller.stop_workflow();
    eventually("step noticed the stop", || stopped_early.load(Ordering::SeqCst)).await;
    eventually("chunks recorded", || {
        controller.step_states()["chunks"].status == StepStatus::Completed
    })
    .await;

    let inst = controller.instance().unwrap();
    assert_eq!(inst.status, WorkflowStatus::Cancelled);
    assert_eq!(inst.context.device.status.battery_level, 0.5);
    assert_eq!(inst.step("notify").unwrap().status, StepStatus::Pending);
    assert!(inst.result.is_none());
}
