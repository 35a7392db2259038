//! Connectivity watcher: replays the offline queue when the network returns.

use std::time::Duration;

use crate::controller::WorkflowController;

/// Watch device updates and drain the offline queue on every offline → online
/// edge, plus a periodic sweep for entries that failed their last replay.
/// Runs until the task is aborted.
pub async fn spawn_connectivity_watcher(controller: WorkflowController, check_interval_secs: u64) {
    let check_interval_secs = check_interval_secs.max(1);
    tracing::info!(
        "📡 Connectivity watcher started (sweep every {}s)",
        check_interval_secs
    );

    let mut device = controller.subscribe_device();
    let mut was_online = device.borrow_and_update().is_online();
    let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs));
    // First tick fires immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            changed = device.changed() => {
                if changed.is_err() {
                    tracing::debug!("📡 Device monitor gone, watcher exiting");
                    return;
                }
                let online = device.borrow_and_update().is_online();
                if online && !was_online && controller.offline_queue_len() > 0 {
                    let report = controller.process_offline_queue().await;
                    tracing::info!(
                        "📶 Reconnected: replayed {} ({} ok, {} re-queued)",
                        report.replayed,
                        report.succeeded,
                        report.requeued
                    );
                }
                was_online = online;
            }
            _ = interval.tick() => {
                if was_online && controller.offline_queue_len() > 0 {
                    controller.process_offline_queue().await;
                }
            }
        }
    }
}
