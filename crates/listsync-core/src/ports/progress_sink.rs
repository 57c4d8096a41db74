//! Progress sink port (driving side observer)
//!
//! The batch orchestrator publishes a [`SyncProgress`] snapshot after every
//! change. Sinks run synchronously on the orchestrator's task, so they must
//! return quickly and must not block. A panicking sink is contained by the
//! orchestrator and never aborts the batch.

use crate::domain::progress::SyncProgress;

/// Receives live progress snapshots
pub trait IProgressSink: Send + Sync {
    /// Called with the latest snapshot after every change
    fn on_progress(&self, progress: &SyncProgress);
}

impl<F> IProgressSink for F
where
    F: Fn(&SyncProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &SyncProgress) {
        self(progress)
    }
}

/// Sink that discards every snapshot
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl IProgressSink for NoopProgressSink {
    fn on_progress(&self, _progress: &SyncProgress) {}
}
