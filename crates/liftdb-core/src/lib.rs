//! Liftdb core - source version detection and the resumable upgrade engine.
//!
//! This crate upgrades a legacy installation by running an ordered queue of
//! independent migration jobs against a detected source schema version. It
//! provides:
//! - Priority-ordered version detection over a [`SchemaProbe`]
//! - Catalog resolution of the eligible job queue per version
//! - A checkpointed batch engine doing one bounded tick at a time
//! - Durable checkpoint hand-off for schedulers that tear the process down
//!
//! The jobs themselves are opaque: each reports one [`JobOutcome`] per
//! invocation, and the engine never looks inside.
//!
//! # Example
//!
//! ```ignore
//! use liftdb_core::{BatchEngine, Checkpoint, MigrationCatalog, TracingLogger};
//!
//! let catalog = MigrationCatalog::new(store);
//! let mut engine = BatchEngine::new(catalog, executor, Arc::new(TracingLogger));
//!
//! let mut checkpoint = Checkpoint::new(job_ids);
//! loop {
//!     let fraction = engine.tick(&mut checkpoint)?;
//!     persist(&checkpoint)?;
//!     if fraction >= 1.0 {
//!         break;
//!     }
//! }
//! let summary = engine.finish(&checkpoint);
//! ```

pub mod batch;
pub mod catalog;
pub mod detect;
pub mod error;
pub mod executor;
pub mod probe;
pub mod runner;

// Batch types
pub use batch::{
    BatchEngine, Checkpoint, CheckpointStore, JobOutcome, MessageBuffer, ResultAggregator, Summary,
    ELLIPSIS, MESSAGE_WINDOW,
};

// Catalog types
pub use catalog::{
    version_tag, JobId, JobStore, MemoryJobStore, MigrationCatalog, MigrationDescriptor,
    SETTING_SOURCE_BASE_PATH, SETTING_SOURCE_KEY,
};

// Detection types
pub use detect::{detect_source_version, VersionMarker};

// Error types
pub use error::Error;

// Executor and logging contracts
pub use executor::{JobExecutor, Logger, MemoryLogger, MessageCapture, NullLogger, TracingLogger};

// Probe contract
pub use probe::{ProbeError, SchemaProbe};

// Runner types
pub use runner::{SourceConfig, UpgradeRunner};
