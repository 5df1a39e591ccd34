//! One-way log sink for operator-facing server messages.
//!
//! Every message is emitted through `tracing` at `info` with target
//! `bpmcp::mcp` and fanned out on a broadcast channel. Sending never blocks
//! and never fails the caller: with no subscribers the broadcast is dropped,
//! and lagging subscribers lose the oldest messages.

use tokio::sync::broadcast;

/// Default number of buffered messages per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct LogSink {
    tx: broadcast::Sender<String>,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        LogSink { tx }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "bpmcp::mcp", "{}", message);
        let _ = self.tx.send(message);
    }

    /// Receives every message logged after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        LogSink::new(DEFAULT_CAPACITY)
    }
}
