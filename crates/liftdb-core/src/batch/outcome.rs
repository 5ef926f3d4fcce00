//! Job outcome vocabulary.

/// Result code a migration job reports for one execution attempt.
///
/// Every outcome except `Incomplete` permanently retires the job: the batch
/// never retries a `Failed`, `Skipped`, or `Disabled` job on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobOutcome {
    /// The job imported everything it had to import.
    Completed,
    /// The job did a bounded slice of work and wants to be invoked again.
    Incomplete,
    /// The job asked for the import to stop.
    Stopped,
    /// The job failed.
    Failed,
    /// The job was skipped because its dependencies were not fulfilled.
    Skipped,
    /// The job is disabled.
    Disabled,
}

impl JobOutcome {
    /// Whether this outcome retires the job from the queue.
    pub fn retires(&self) -> bool {
        !matches!(self, JobOutcome::Incomplete)
    }
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobOutcome::Completed => write!(f, "completed"),
            JobOutcome::Incomplete => write!(f, "incomplete"),
            JobOutcome::Stopped => write!(f, "stopped"),
            JobOutcome::Failed => write!(f, "failed"),
            JobOutcome::Skipped => write!(f, "skipped"),
            JobOutcome::Disabled => write!(f, "disabled"),
        }
    }
}
