//! Diagnostic log-line stream
//!
//! Both scheduler backends emit a human-readable line for every
//! schedule/fire/cancel/auto-release event. The stream is purely
//! observational: subscribers come and go freely and lagging receivers only
//! lose lines, never affect scheduling. Structured `tracing` events are
//! emitted in parallel by the backends themselves.

use tokio::sync::broadcast;

/// Default number of lines buffered per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// Broadcast stream of diagnostic lines.
#[derive(Debug, Clone)]
pub struct LogStream {
    sender: broadcast::Sender<String>,
}

impl LogStream {
    /// Stream with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Stream buffering up to `capacity` lines per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to all lines emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// Emit one line. Having no subscribers is normal and not an error.
    pub fn emit(&self, line: impl Into<String>) {
        let line = line.into();
        let _ = self.sender.send(line);
    }
}

impl Default for LogStream {
    fn default() -> Self {
        Self::new()
    }
}
