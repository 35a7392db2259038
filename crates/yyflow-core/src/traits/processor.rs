//! Offline operation replay.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::Result;

/// An operation deferred while offline (opaque to the controller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineOperation {
    /// Operation kind, e.g. "attendance.mark" or "message.send".
    pub kind: String,
    /// Freeform payload interpreted by the processor.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl OfflineOperation {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// Applies an offline operation once connectivity is back.
#[async_trait]
pub trait OperationProcessor: Send + Sync {
    async fn process(&self, operation: &OfflineOperation) -> Result<()>;
}

/// Closures returning a future are processors.
#[async_trait]
impl<F, Fut> OperationProcessor for F
where
    F: Fn(OfflineOperation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn process(&self, operation: &OfflineOperation) -> Result<()> {
        (self)(operation.clone()).await
    }
}
