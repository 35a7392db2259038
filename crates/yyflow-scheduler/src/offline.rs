//! Offline Queue: operations deferred while the device has no network.
//!
//! ```text
//! enqueue(op) ──► [e1, e2, e3]            (bounded FIFO, oldest evicted on overflow)
//! drain()     ──► snapshot + clear ──► replay e1, e2, e3 in order
//!                                     └─ failures appended to the tail again
//! ```
//! One pass per drain call. A permanently failing entry sinks to the back
//! instead of blocking newer entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use yyflow_core::types::NetworkQuality;
use yyflow_core::traits::{OfflineOperation, OperationProcessor};

/// A queued operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfflineEntry {
    pub id: String,
    pub operation: OfflineOperation,
    pub enqueued_at: DateTime<Utc>,
    /// Failed replay attempts so far.
    pub attempts: u32,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub replayed: usize,
    pub succeeded: usize,
    pub requeued: usize,
}

impl DrainReport {
    pub fn is_noop(&self) -> bool {
        self.replayed == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub queued: usize,
    pub capacity: usize,
    pub total_enqueued: u64,
    pub total_replayed: u64,
    pub overflowed: u64,
}

pub struct OfflineQueue {
    entries: Mutex<VecDeque<OfflineEntry>>,
    /// 0 = unbounded.
    capacity: usize,
    total_enqueued: AtomicU64,
    total_replayed: AtomicU64,
    overflowed: AtomicU64,
}

impl OfflineQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
            total_enqueued: AtomicU64::new(0),
            total_replayed: AtomicU64::new(0),
            overflowed: AtomicU64::new(0),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<OfflineEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an operation. Never blocks; returns the entry id.
    pub fn enqueue(&self, operation: OfflineOperation) -> String {
        let entry = OfflineEntry {
            id: uuid::Uuid::new_v4().to_string(),
            operation,
            enqueued_at: Utc::now(),
            attempts: 0,
        };
        let id = entry.id.clone();
        tracing::debug!("📥 Offline enqueue: {} ({})", entry.operation.kind, id);
        self.push_back(entry);
        self.total_enqueued.fetch_add(1, Ordering::Relaxed);
        id
    }

    fn push_back(&self, entry: OfflineEntry) {
        let mut queue = self.lock();
        queue.push_back(entry);
        if self.capacity > 0 {
            while queue.len() > self.capacity {
                if let Some(evicted) = queue.pop_front() {
                    self.overflowed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        "⚠️ Offline queue full ({}), dropped oldest: {} ({})",
                        self.capacity,
                        evicted.operation.kind,
                        evicted.id
                    );
                }
            }
        }
    }

    /// Replay every queued entry once. No-op while offline or when empty.
    pub async fn drain(&self, network: NetworkQuality, processor: &dyn OperationProcessor) -> DrainReport {
        if network.is_offline() {
            return DrainReport::default();
        }
        let batch: Vec<OfflineEntry> = {
            let mut queue = self.lock();
            if queue.is_empty() {
                return DrainReport::default();
            }
            queue.drain(..).collect()
        };

        tracing::info!("🔄 Replaying {} offline operation(s)", batch.len());
        let mut report = DrainReport::default();
        for mut entry in batch {
            report.replayed += 1;
            match processor.process(&entry.operation).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    entry.attempts += 1;
                    tracing::warn!(
                        "⚠️ Offline replay failed for {} ({}), attempt {}: {}",
                        entry.operation.kind,
                        entry.id,
                        entry.attempts,
                        e
                    );
                    self.push_back(entry);
                    report.requeued += 1;
                }
            }
        }
        self.total_replayed.fetch_add(report.replayed as u64, Ordering::Relaxed);

        if report.requeued > 0 {
            tracing::info!(
                "📤 Offline drain: {} ok, {} re-queued",
                report.succeeded,
                report.requeued
            );
        }
        report
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the queued entries in drain order.
    pub fn entries(&self) -> Vec<OfflineEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Drop everything queued. Returns how many entries were discarded.
    pub fn clear(&self) -> usize {
        let mut queue = self.lock();
        let n = queue.len();
        queue.clear();
        n
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.len(),
            capacity: self.capacity,
            total_enqueued: self.total_enqueued.load(Ordering::Relaxed),
            total_replayed: self.total_replayed.load(Ordering::Relaxed),
            overflowed: self.overflowed.load(Ordering::Relaxed),
        }
    }
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use yyflow_core::error::YyFlowError;

    fn op(kind: &str) -> OfflineOperation {
        OfflineOperation::new(kind, serde_json::json!({}))
    }

    #[tokio::test]
    async fn test_offline_drain_is_noop() {
        let queue = OfflineQueue::unbounded();
        queue.enqueue(op("a"));
        let processor = |_op: OfflineOperation| async { Ok::<(), YyFlowError>(()) };
        let report = queue.drain(NetworkQuality::Offline, &processor).await;
        assert!(report.is_noop());
        assert_eq!(queue.len(), 1);

        let empty = OfflineQueue::unbounded();
        assert!(empty.drain(NetworkQuality::Good, &processor).await.is_noop());
    }

    #[tokio::test]
    async fn test_replays_in_enqueue_order() {
        let queue = OfflineQueue::unbounded();
        for k in ["a", "b", "c"] {
            queue.enqueue(op(k));
        }
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let processor = move |op: OfflineOperation| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(op.kind);
                Ok::<(), YyFlowError>(())
            }
        };
        let report = queue.drain(NetworkQuality::Good, &processor).await;
        assert_eq!(report, DrainReport { replayed: 3, succeeded: 3, requeued: 0 });
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_all_failing_keeps_cardinality() {
        let queue = OfflineQueue::unbounded();
        for k in ["a", "b", "c"] {
            queue.enqueue(op(k));
        }
        let processor =
            |_op: OfflineOperation| async { Err::<(), _>(YyFlowError::OfflineReplayFailed("500".into())) };
        let report = queue.drain(NetworkQuality::Poor, &processor).await;
        assert_eq!(report.requeued, 3);
        assert_eq!(queue.len(), 3);
        assert!(queue.entries().iter().all(|e| e.attempts == 1));
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let queue = OfflineQueue::new(2);
        queue.enqueue(op("a"));
        queue.enqueue(op("b"));
        queue.enqueue(op("c"));
        let kinds: Vec<String> = queue.entries().into_iter().map(|e| e.operation.kind).collect();
        assert_eq!(kinds, vec!["b", "c"]);
        let stats = queue.stats();
        assert_eq!(stats.overflowed, 1);
        assert_eq!(stats.total_enqueued, 3);
    }

    #[test]
    fn test_entry_ids_unique() {
        let queue = OfflineQueue::unbounded();
        let a = queue.enqueue(op("a"));
        let b = queue.enqueue(op("a"));
        assert_ne!(a, b);
        assert_eq!(queue.clear(), 2);
    }
}
