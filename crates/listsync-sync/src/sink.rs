//! Progress sinks for cross-task consumers
//!
//! The orchestrator calls sinks synchronously on its own task. A UI running
//! on another task should not be mutated from there; [`ChannelProgressSink`]
//! forwards cloned snapshots over an unbounded channel instead.

use listsync_core::domain::progress::SyncProgress;
use listsync_core::ports::progress_sink::IProgressSink;
use tokio::sync::mpsc;
use tracing::trace;

/// Forwards every snapshot to an `mpsc` receiver
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<SyncProgress>,
}

impl ChannelProgressSink {
    /// Creates a sink and the receiver its snapshots arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl IProgressSink for ChannelProgressSink {
    fn on_progress(&self, progress: &SyncProgress) {
        if self.tx.send(progress.clone()).is_err() {
            trace!("Progress receiver dropped, snapshot discarded");
        }
    }
}
