//! Status message buffer and result counters.
//!
//! Both live inside the checkpoint so the whole run state serializes as a
//! single unit.

use rkyv::{Archive, Deserialize, Serialize};

/// Number of recent messages surfaced for display.
pub const MESSAGE_WINDOW: usize = 10;

/// Marker shown after the oldest displayed message when older entries exist.
pub const ELLIPSIS: &str = "…";

/// Append-only status log with a capped display window.
///
/// Every message ever appended stays in the durable log; only the most
/// recent [`MESSAGE_WINDOW`] entries are surfaced, newest first.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct MessageBuffer {
    entries: Vec<String>,
}

impl MessageBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a status line.
    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    /// Total number of messages appended so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no message was ever appended.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The full durable log, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The visible window: the most recent entries, newest first, capped at
    /// [`MESSAGE_WINDOW`].
    pub fn window(&self) -> Vec<&str> {
        self.entries
            .iter()
            .rev()
            .take(MESSAGE_WINDOW)
            .map(String::as_str)
            .collect()
    }

    /// Whether the window hides older entries.
    pub fn truncated(&self) -> bool {
        self.entries.len() > MESSAGE_WINDOW
    }

    /// Render the window one message per line, ending with the ellipsis
    /// marker when older entries are hidden.
    pub fn render(&self) -> String {
        let mut lines = self.window().join("\n");
        if self.truncated() {
            lines.push('\n');
            lines.push_str(ELLIPSIS);
        }
        lines
    }
}

/// Running success/failure counts for a batch.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ResultAggregator {
    /// Jobs that completed successfully.
    pub successes: u64,
    /// Jobs that failed.
    pub failures: u64,
}

impl ResultAggregator {
    /// Count one completed job.
    pub fn record_success(&mut self) {
        self.successes += 1;
    }

    /// Count one failed job.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }
}
