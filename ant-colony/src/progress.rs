//! Per-round progress reporting
//!
//! The coordinator emits one line per productive round through a
//! [`ProgressSink`], keeping the round loop independent of where the lines
//! end up.

use std::sync::{Mutex, PoisonError};

use tracing::info;

/// Receives one human-readable line per productive round.
pub trait ProgressSink: Send + Sync {
    /// Deliver one progress line.
    fn emit(&self, line: &str);
}

/// Routes progress lines into the tracing pipeline at `info` level.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, line: &str) {
        info!("{line}");
    }
}

/// Discards every line.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _line: &str) {}
}

/// Buffers every line for later inspection.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Drain the buffered lines.
    pub fn take(&self) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut lines)
    }
}

impl ProgressSink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_buffers_in_order() {
        let sink = MemorySink::default();
        sink.emit("iteration 1");
        sink.emit("iteration 2");
        assert_eq!(sink.take(), vec!["iteration 1", "iteration 2"]);
        assert!(sink.take().is_empty());
    }
}
