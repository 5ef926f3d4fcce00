//! The batch engine: a checkpointed tick loop over the job queue.
//!
//! Each [`BatchEngine::tick`] does up to one job's worth of work and returns
//! the finished fraction. The embedding scheduler persists the checkpoint
//! between calls, keeps calling until the fraction reaches 1.0, then calls
//! [`BatchEngine::finish`] for the terminal summary. The engine keeps no
//! state of its own between ticks; everything needed to resume lives in the
//! checkpoint.

use super::checkpoint::Checkpoint;
use super::outcome::JobOutcome;
use crate::catalog::{MigrationCatalog, MigrationDescriptor};
use crate::error::Error;
use crate::executor::{JobExecutor, Logger, MessageCapture};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Terminal report of one upgrade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Jobs that completed successfully.
    pub successes: u64,
    /// Jobs that failed.
    pub failures: u64,
    /// Closing status line: celebratory on a zero-failure run, explicit
    /// otherwise.
    pub message: String,
    /// Where the detailed migration log can be reviewed, when configured.
    pub log_link: Option<String>,
}

/// Orchestrates one upgrade run over an ordered job queue.
///
/// The engine exclusively owns checkpoint mutation for the lifetime of a
/// run. It is single-threaded by contract: no two ticks for the same
/// checkpoint may execute concurrently, and suspension happens only at tick
/// boundaries.
pub struct BatchEngine {
    catalog: MigrationCatalog,
    executor: Box<dyn JobExecutor>,
    logger: Arc<dyn Logger>,
    log_link: Option<String>,
}

impl BatchEngine {
    /// Create an engine over the given catalog, executor, and logger.
    pub fn new(
        catalog: MigrationCatalog,
        executor: Box<dyn JobExecutor>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            catalog,
            executor,
            logger,
            log_link: None,
        }
    }

    /// Configure a link to a detailed log view, surfaced in the summary.
    pub fn with_log_link(mut self, link: impl Into<String>) -> Self {
        self.log_link = Some(link.into());
        self
    }

    /// Advance the run by up to one job's worth of work.
    ///
    /// The head job is attempted and, unless it reports
    /// [`JobOutcome::Incomplete`], retired. A job that vanished from storage
    /// retires immediately with no outcome recorded. Executor panics are
    /// trapped and downgraded to [`JobOutcome::Failed`]; a single job's
    /// internal fault never aborts the run.
    ///
    /// Returns the finished fraction, exactly 1.0 once the queue is empty.
    /// Calling `tick` on an already drained queue is a contract violation
    /// and returns [`Error::BatchFinished`].
    #[instrument(skip_all, fields(index = checkpoint.current_index, pending = checkpoint.pending.len()))]
    pub fn tick(&mut self, checkpoint: &mut Checkpoint) -> Result<f64, Error> {
        let Some(id) = checkpoint.head().map(str::to_owned) else {
            return Err(Error::BatchFinished);
        };

        match self.catalog.descriptor(&id) {
            Some(job) => self.run_job(&job, checkpoint),
            None => {
                // Tolerate inconsistent catalog state: retire with no
                // outcome recorded.
                debug!(job = %id, "job vanished from storage, retiring");
                checkpoint.retire_head();
            }
        }

        Ok(checkpoint.finished_fraction())
    }

    fn run_job(&mut self, job: &MigrationDescriptor, checkpoint: &mut Checkpoint) {
        let name = job.display_name().to_string();
        let mut capture = MessageCapture::new();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.executor.execute(job, &mut capture)
        }));
        let outcome = result.unwrap_or_else(|payload| {
            self.logger.error(&format!(
                "Import of {name} trapped: {}",
                panic_text(payload.as_ref())
            ));
            JobOutcome::Failed
        });

        match outcome {
            JobOutcome::Completed => {
                checkpoint.results.record_success();
                let line = format!("Imported {name}");
                checkpoint.messages.push(line.as_str());
                self.logger.notice(&line);
                checkpoint.retire_head();
            }
            JobOutcome::Failed => {
                checkpoint.results.record_failure();
                let line = format!("Import of {name} failed");
                checkpoint.messages.push(line.as_str());
                self.logger.error(&line);
                checkpoint.retire_head();
            }
            JobOutcome::Skipped => {
                let line = format!("Import of {name} skipped due to unfulfilled dependencies");
                checkpoint.messages.push(line.as_str());
                self.logger.error(&line);
                checkpoint.retire_head();
            }
            JobOutcome::Stopped => {
                checkpoint.messages.push("Import stopped by request");
                checkpoint.retire_head();
            }
            JobOutcome::Disabled => {
                // Retire silently.
                checkpoint.retire_head();
            }
            JobOutcome::Incomplete => {
                // Leave the job at the head; it resumes on the next tick.
                checkpoint.messages.push(format!(
                    "Importing {name} ({current} of {max})",
                    current = checkpoint.current_index,
                    max = checkpoint.total
                ));
            }
        }

        for message in capture.drain() {
            self.logger.notice(&message);
            checkpoint.messages.push(message);
        }
    }

    /// Produce the terminal summary. Call once, after the finished fraction
    /// reaches 1.0.
    pub fn finish(&self, checkpoint: &Checkpoint) -> Summary {
        let successes = checkpoint.results.successes;
        let failures = checkpoint.results.failures;

        self.logger.notice("Import complete.");
        if successes > 0 {
            self.logger.notice(&format!("{} succeeded", count_label(successes)));
        }
        if failures > 0 {
            self.logger.notice(&format!("{} failed", count_label(failures)));
        }
        if let Some(link) = &self.log_link {
            self.logger
                .notice(&format!("Review the detailed migration log at {link}"));
        }

        let message = if failures == 0 {
            "Congratulations, you upgraded your site!".to_string()
        } else {
            "The import process has not completed.".to_string()
        };
        self.logger.notice(&message);

        Summary {
            successes,
            failures,
            message,
            log_link: self.log_link.clone(),
        }
    }
}

/// "1 migration" / "n migrations".
fn count_label(count: u64) -> String {
    if count == 1 {
        "1 migration".to_string()
    } else {
        format!("{count} migrations")
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{version_tag, MemoryJobStore, MigrationDescriptor};
    use crate::executor::MemoryLogger;
    use std::collections::HashMap;

    /// Executor that replays a script of outcomes per job id.
    struct ScriptedExecutor {
        script: HashMap<String, Vec<JobOutcome>>,
    }

    impl ScriptedExecutor {
        fn new(script: &[(&str, &[JobOutcome])]) -> Self {
            Self {
                script: script
                    .iter()
                    .map(|(id, outcomes)| (id.to_string(), outcomes.to_vec()))
                    .collect(),
            }
        }
    }

    impl JobExecutor for ScriptedExecutor {
        fn execute(
            &mut self,
            job: &MigrationDescriptor,
            _messages: &mut MessageCapture,
        ) -> JobOutcome {
            match self.script.get_mut(&job.id) {
                Some(outcomes) if !outcomes.is_empty() => outcomes.remove(0),
                _ => JobOutcome::Completed,
            }
        }

        fn rollback(
            &mut self,
            _job: &MigrationDescriptor,
            _messages: &mut MessageCapture,
        ) -> JobOutcome {
            JobOutcome::Completed
        }
    }

    struct PanickingExecutor;

    impl JobExecutor for PanickingExecutor {
        fn execute(
            &mut self,
            _job: &MigrationDescriptor,
            _messages: &mut MessageCapture,
        ) -> JobOutcome {
            panic!("executor blew up");
        }

        fn rollback(
            &mut self,
            _job: &MigrationDescriptor,
            _messages: &mut MessageCapture,
        ) -> JobOutcome {
            JobOutcome::Completed
        }
    }

    fn catalog_with(ids: &[&str]) -> MigrationCatalog {
        let store = MemoryJobStore::new();
        for (position, id) in ids.iter().enumerate() {
            store.insert(
                MigrationDescriptor::new(*id, format!("Job {id}"))
                    .with_tag(version_tag(6))
                    .with_weight(position as i64),
            );
        }
        MigrationCatalog::new(Arc::new(store))
    }

    fn engine_for(
        ids: &[&str],
        script: &[(&str, &[JobOutcome])],
    ) -> (BatchEngine, Checkpoint, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let engine = BatchEngine::new(
            catalog_with(ids),
            Box::new(ScriptedExecutor::new(script)),
            logger.clone(),
        );
        let checkpoint = Checkpoint::new(ids.iter().map(|s| s.to_string()).collect());
        (engine, checkpoint, logger)
    }

    #[test]
    fn test_completed_job_retires_and_counts() {
        let (mut engine, mut cp, logger) = engine_for(&["a"], &[("a", &[JobOutcome::Completed])]);

        let fraction = engine.tick(&mut cp).unwrap();
        assert_eq!(fraction, 1.0);
        assert_eq!(cp.results.successes, 1);
        assert_eq!(cp.messages.window(), vec!["Imported Job a"]);
        assert!(logger.notices().contains(&"Imported Job a".to_string()));
    }

    #[test]
    fn test_failed_job_counts_and_continues() {
        let (mut engine, mut cp, logger) = engine_for(
            &["a", "b"],
            &[("a", &[JobOutcome::Failed]), ("b", &[JobOutcome::Completed])],
        );

        let fraction = engine.tick(&mut cp).unwrap();
        assert_eq!(fraction, 0.5);
        assert_eq!(cp.results.failures, 1);
        assert!(logger.errors().contains(&"Import of Job a failed".to_string()));

        let fraction = engine.tick(&mut cp).unwrap();
        assert_eq!(fraction, 1.0);
        assert_eq!(cp.results.successes, 1);
    }

    #[test]
    fn test_incomplete_keeps_head_and_counter() {
        let (mut engine, mut cp, _logger) = engine_for(
            &["a", "b"],
            &[(
                "a",
                &[
                    JobOutcome::Incomplete,
                    JobOutcome::Incomplete,
                    JobOutcome::Completed,
                ],
            )],
        );

        for _ in 0..2 {
            let fraction = engine.tick(&mut cp).unwrap();
            assert_eq!(fraction, 0.0);
            assert_eq!(cp.head(), Some("a"));
            assert_eq!(cp.current_index, 1);
        }
        assert!(cp
            .messages
            .window()
            .contains(&"Importing Job a (1 of 2)"));

        engine.tick(&mut cp).unwrap();
        assert_eq!(cp.head(), Some("b"));
        assert_eq!(cp.current_index, 2);
    }

    #[test]
    fn test_skipped_job_is_neither_success_nor_failure() {
        let (mut engine, mut cp, logger) = engine_for(&["a"], &[("a", &[JobOutcome::Skipped])]);

        engine.tick(&mut cp).unwrap();
        assert_eq!(cp.results.successes, 0);
        assert_eq!(cp.results.failures, 0);
        assert!(cp.is_finished());
        assert!(logger.errors()[0].contains("skipped due to unfulfilled dependencies"));
    }

    #[test]
    fn test_disabled_job_retires_silently() {
        let (mut engine, mut cp, logger) = engine_for(&["a"], &[("a", &[JobOutcome::Disabled])]);

        engine.tick(&mut cp).unwrap();
        assert!(cp.is_finished());
        assert!(cp.messages.is_empty());
        assert!(logger.notices().is_empty());
        assert!(logger.errors().is_empty());
    }

    #[test]
    fn test_stopped_job_messages_and_run_continues() {
        let (mut engine, mut cp, _logger) = engine_for(
            &["a", "b"],
            &[("a", &[JobOutcome::Stopped]), ("b", &[JobOutcome::Completed])],
        );

        engine.tick(&mut cp).unwrap();
        assert_eq!(cp.messages.window(), vec!["Import stopped by request"]);
        assert_eq!(cp.head(), Some("b"));

        engine.tick(&mut cp).unwrap();
        assert!(cp.is_finished());
        assert_eq!(cp.results.successes, 1);
    }

    #[test]
    fn test_panicking_executor_downgrades_to_failed() {
        let logger = Arc::new(MemoryLogger::new());
        let mut engine = BatchEngine::new(
            catalog_with(&["a", "b"]),
            Box::new(PanickingExecutor),
            logger.clone(),
        );
        let mut cp = Checkpoint::new(vec!["a".to_string(), "b".to_string()]);

        let fraction = engine.tick(&mut cp).unwrap();
        assert_eq!(fraction, 0.5);
        assert_eq!(cp.results.failures, 1);
        assert!(logger
            .errors()
            .iter()
            .any(|line| line.contains("executor blew up")));

        // The run keeps going.
        engine.tick(&mut cp).unwrap();
        assert_eq!(cp.results.failures, 2);
        assert!(cp.is_finished());
    }

    #[test]
    fn test_vanished_job_retires_without_outcome() {
        // Checkpoint knows a job the store no longer has.
        let (mut engine, _, logger) = engine_for(&["a"], &[]);
        let mut cp = Checkpoint::new(vec!["ghost".to_string(), "a".to_string()]);

        let fraction = engine.tick(&mut cp).unwrap();
        assert_eq!(fraction, 0.5);
        assert_eq!(cp.current_index, 2);
        assert_eq!(cp.results.successes, 0);
        assert_eq!(cp.results.failures, 0);
        assert!(cp.messages.is_empty());
        assert!(logger.errors().is_empty());
    }

    #[test]
    fn test_tick_after_finish_is_an_error() {
        let (mut engine, mut cp, _logger) = engine_for(&["a"], &[]);

        engine.tick(&mut cp).unwrap();
        assert!(cp.is_finished());
        assert!(matches!(engine.tick(&mut cp), Err(Error::BatchFinished)));
    }

    #[test]
    fn test_captured_messages_reach_log_and_checkpoint() {
        struct ChattyExecutor;

        impl JobExecutor for ChattyExecutor {
            fn execute(
                &mut self,
                _job: &MigrationDescriptor,
                messages: &mut MessageCapture,
            ) -> JobOutcome {
                messages.capture("row 17 had no author");
                JobOutcome::Completed
            }

            fn rollback(
                &mut self,
                _job: &MigrationDescriptor,
                _messages: &mut MessageCapture,
            ) -> JobOutcome {
                JobOutcome::Completed
            }
        }

        let logger = Arc::new(MemoryLogger::new());
        let mut engine = BatchEngine::new(
            catalog_with(&["a"]),
            Box::new(ChattyExecutor),
            logger.clone(),
        );
        let mut cp = Checkpoint::new(vec!["a".to_string()]);

        engine.tick(&mut cp).unwrap();
        // Newest first: the diagnostic line lands after the outcome line.
        assert_eq!(
            cp.messages.window(),
            vec!["row 17 had no author", "Imported Job a"]
        );
        assert!(logger
            .notices()
            .contains(&"row 17 had no author".to_string()));
    }

    #[test]
    fn test_finish_celebrates_zero_failures() {
        let (mut engine, mut cp, _logger) = engine_for(
            &["a", "b"],
            &[("a", &[JobOutcome::Completed]), ("b", &[JobOutcome::Completed])],
        );

        while !cp.is_finished() {
            engine.tick(&mut cp).unwrap();
        }
        let summary = engine.finish(&cp);

        assert_eq!(summary.successes, 2);
        assert_eq!(summary.failures, 0);
        assert_eq!(summary.message, "Congratulations, you upgraded your site!");
        assert!(summary.log_link.is_none());
    }

    #[test]
    fn test_finish_reports_incomplete_process_on_failures() {
        let (mut engine, mut cp, logger) = engine_for(
            &["a", "b", "c"],
            &[
                ("a", &[JobOutcome::Completed]),
                ("b", &[JobOutcome::Failed]),
                ("c", &[JobOutcome::Skipped]),
            ],
        );

        while !cp.is_finished() {
            engine.tick(&mut cp).unwrap();
        }
        let summary = engine.finish(&cp);

        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.message, "The import process has not completed.");
        assert!(logger.notices().contains(&"1 migration succeeded".to_string()));
        assert!(logger.notices().contains(&"1 migration failed".to_string()));
    }

    #[test]
    fn test_finish_surfaces_log_link() {
        let logger = Arc::new(MemoryLogger::new());
        let engine = BatchEngine::new(
            catalog_with(&["a"]),
            Box::new(ScriptedExecutor::new(&[])),
            logger.clone(),
        )
        .with_log_link("/upgrade-log");

        let cp = Checkpoint::new(Vec::new());
        let summary = engine.finish(&cp);

        assert_eq!(summary.log_link.as_deref(), Some("/upgrade-log"));
        assert!(logger
            .notices()
            .iter()
            .any(|line| line.contains("/upgrade-log")));
    }

    #[test]
    fn test_count_label_pluralizes() {
        assert_eq!(count_label(1), "1 migration");
        assert_eq!(count_label(3), "3 migrations");
    }
}
