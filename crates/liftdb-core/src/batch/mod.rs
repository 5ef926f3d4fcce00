//! Resumable batch execution.
//!
//! The engine processes an ordered queue of migration jobs one bounded
//! "tick" at a time. All state needed to resume lives in the [`Checkpoint`],
//! which the embedding scheduler persists between ticks; the process may be
//! torn down and resumed from a deserialized copy at any tick boundary.

mod checkpoint;
mod engine;
mod message;
mod outcome;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use engine::{BatchEngine, Summary};
pub use message::{MessageBuffer, ResultAggregator, ELLIPSIS, MESSAGE_WINDOW};
pub use outcome::JobOutcome;
