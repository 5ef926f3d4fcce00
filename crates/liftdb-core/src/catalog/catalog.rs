//! Catalog resolution: detected version to ordered job queue.

use super::descriptor::{JobId, MigrationDescriptor};
use super::store::JobStore;
use std::sync::Arc;

/// Group tag carried by every job eligible for the given source version.
pub fn version_tag(version: u32) -> String {
    format!("upgrade_{version}")
}

/// Resolves which migration jobs apply to a detected source version.
#[derive(Clone)]
pub struct MigrationCatalog {
    store: Arc<dyn JobStore>,
}

impl MigrationCatalog {
    /// Create a catalog over the given job store.
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Ordered ids of every job tagged for `version`.
    ///
    /// The store's ordering is trusted to respect inter-job dependencies;
    /// no sorting happens here. An empty result means there is no upgrade
    /// path for the version — callers surface that as a distinct failure,
    /// it is not an error at this layer.
    pub fn resolve(&self, version: u32) -> Vec<JobId> {
        self.store.query_by_tag(&version_tag(version))
    }

    /// Load the full descriptor for one job.
    pub fn descriptor(&self, id: &str) -> Option<MigrationDescriptor> {
        self.store.load_descriptor(id)
    }
}
