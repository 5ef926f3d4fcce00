//! Batch checkpoint: the durable state handed between ticks.

use super::message::{MessageBuffer, ResultAggregator};
use crate::catalog::JobId;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// Externally persisted state of one upgrade run.
///
/// The engine owns and mutates the checkpoint for the lifetime of a run;
/// between ticks the embedding scheduler holds it and may serialize it
/// across process boundaries. The queue, the message log, and the counters
/// travel as a single unit so a deserialized copy resumes losslessly.
///
/// Invariant: after any tick that retires a job,
/// `pending.len() + current_index - 1 == total`.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct Checkpoint {
    /// Jobs not yet retired, in dependency order. Only the head is ever
    /// removed.
    pub pending: Vec<JobId>,
    /// Number of jobs at the start of the run; the progress denominator.
    pub total: usize,
    /// 1-based counter of jobs attempted so far. Advances once per retired
    /// job; an `Incomplete` job consumes ticks without advancing it.
    pub current_index: usize,
    /// Rolling status log.
    pub messages: MessageBuffer,
    /// Success/failure counts.
    pub results: ResultAggregator,
}

impl Checkpoint {
    /// Create the initial checkpoint for an ordered job queue.
    pub fn new(jobs: Vec<JobId>) -> Self {
        let total = jobs.len();
        Self {
            pending: jobs,
            total,
            current_index: 1,
            messages: MessageBuffer::new(),
            results: ResultAggregator::default(),
        }
    }

    /// Fraction of the run finished so far; exactly 1.0 once the queue is
    /// empty.
    pub fn finished_fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        1.0 - self.pending.len() as f64 / self.total as f64
    }

    /// Whether every job has been retired.
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// The job currently at the head of the queue.
    pub fn head(&self) -> Option<&str> {
        self.pending.first().map(String::as_str)
    }

    /// Retire the head job and advance the attempt counter.
    pub(crate) fn retire_head(&mut self) {
        if !self.pending.is_empty() {
            self.pending.remove(0);
            self.current_index += 1;
        }
    }

    /// Serialize the checkpoint to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a checkpoint from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Durable checkpoint hand-off between ticks, keyed by run name.
///
/// The embedding scheduler is free to persist checkpoints any other way;
/// this store exists so a host with a sled database gets hand-off for free.
pub struct CheckpointStore {
    tree: sled::Tree,
}

impl CheckpointStore {
    /// Tree name for checkpoints.
    pub const TREE_NAME: &'static str = "upgrade:checkpoint";

    /// Open or create the checkpoint store.
    pub fn open(db: &sled::Db) -> Result<Self, Error> {
        let tree = db.open_tree(Self::TREE_NAME)?;
        Ok(Self { tree })
    }

    /// Save the checkpoint for a run.
    pub fn save(&self, run: &str, checkpoint: &Checkpoint) -> Result<(), Error> {
        let value = checkpoint.to_bytes()?;
        self.tree.insert(run, value)?;
        Ok(())
    }

    /// Load the checkpoint for a run.
    pub fn load(&self, run: &str) -> Result<Option<Checkpoint>, Error> {
        match self.tree.get(run)? {
            Some(bytes) => Ok(Some(Checkpoint::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete the checkpoint for a run.
    pub fn delete(&self, run: &str) -> Result<(), Error> {
        self.tree.remove(run)?;
        Ok(())
    }

    /// Flush changes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.tree.flush()?;
        Ok(())
    }
}
