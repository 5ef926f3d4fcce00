//! Core error types.

use thiserror::Error;

/// Errors surfaced by the upgrade core.
#[derive(Debug, Error)]
pub enum Error {
    /// The source database was rejected by version detection.
    #[error("unsupported source: {reason}")]
    UnsupportedSource {
        /// Why the source was rejected.
        reason: String,
    },

    /// A version was detected but no migration jobs are registered for it.
    #[error("no upgrade path for source version {version}")]
    NoUpgradePath {
        /// The detected source version.
        version: u32,
    },

    /// `tick` was called after the job queue drained.
    #[error("batch already finished")]
    BatchFinished,

    /// Checkpoint storage error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Checkpoint serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Checkpoint deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}
