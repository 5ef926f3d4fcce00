//! Schema probe boundary contract.
//!
//! Version detection inspects the source database only through this trait.
//! Concrete drivers live in adapter crates (see `liftdb-sqlite`); the core
//! never opens a connection itself.

use thiserror::Error;

/// Failure while probing the source schema.
///
/// A probe failure never aborts detection: the detector folds it into an
/// `Unsupported` classification carrying the underlying text.
#[derive(Debug, Clone, Error)]
#[error("schema probe failed: {0}")]
pub struct ProbeError(pub String);

impl ProbeError {
    /// Wrap a driver error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Read-only view of the source database schema.
pub trait SchemaProbe: Send + Sync {
    /// Check whether a table exists in the source schema.
    fn table_exists(&self, name: &str) -> Result<bool, ProbeError>;

    /// Run a query expected to produce at most one scalar value.
    ///
    /// Positional `?` placeholders are bound from `params` in order. A query
    /// matching no rows returns `Ok(None)`.
    fn query_scalar(&self, sql: &str, params: &[&str]) -> Result<Option<String>, ProbeError>;
}
