//! Job execution and logging boundary contracts.

use crate::batch::JobOutcome;
use crate::catalog::MigrationDescriptor;
use std::sync::Mutex;

/// Sink for free-text diagnostics a job emits during one invocation.
///
/// The engine hands a fresh capture to the executor on every tick, appends
/// whatever was captured to the checkpoint's message log, and reports each
/// line to the logger.
#[derive(Debug, Default)]
pub struct MessageCapture {
    messages: Vec<String>,
}

impl MessageCapture {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one diagnostic line.
    pub fn capture(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Take every captured line, leaving the capture empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    /// Check if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Runner for individual migration jobs.
///
/// A job is opaque to the engine: one invocation produces exactly one
/// [`JobOutcome`]. An executor reporting `Incomplete` is re-invoked with the
/// same job on the next tick and is responsible for bounding its work per
/// invocation and resuming its own internal progress; the engine gives it no
/// extra state.
pub trait JobExecutor: Send {
    /// Run one bounded slice of the job.
    fn execute(&mut self, job: &MigrationDescriptor, messages: &mut MessageCapture) -> JobOutcome;

    /// Undo a previously imported job.
    ///
    /// Rollback runs outside the batch engine, in reverse dependency order
    /// (see [`crate::runner::UpgradeRunner::rollback`]).
    fn rollback(&mut self, job: &MigrationDescriptor, messages: &mut MessageCapture) -> JobOutcome;
}

/// Fire-and-forget status feed. Never affects control flow.
pub trait Logger: Send + Sync {
    /// Report a status line.
    fn notice(&self, message: &str);

    /// Report an error line.
    fn error(&self, message: &str);
}

/// Logger backed by the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn notice(&self, message: &str) {
        tracing::info!(target: "liftdb", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "liftdb", "{message}");
    }
}

/// Logger that records lines in memory, for tests and inspection.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    notices: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl MemoryLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notice lines logged so far.
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    /// All error lines logged so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Logger for MemoryLogger {
    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Logger that discards everything.
#[derive(Debug, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn notice(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}
