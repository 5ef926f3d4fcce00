//! Job storage boundary contract.

use super::descriptor::{JobId, MigrationDescriptor};
use std::collections::HashMap;
use std::sync::RwLock;

/// Setting key for the resolved source connection key.
pub const SETTING_SOURCE_KEY: &str = "source.key";

/// Setting key for the base path file-importing jobs read from.
pub const SETTING_SOURCE_BASE_PATH: &str = "destination.base_path";

/// Storage layer owning the migration job definitions.
///
/// The ordering `query_by_tag` returns is trusted to respect inter-job
/// dependencies; the catalog does not re-sort it. Per-job settings are
/// opaque key-value pairs the core writes but never interprets.
pub trait JobStore: Send + Sync {
    /// Load the descriptor for a job, if the store still knows it.
    fn load_descriptor(&self, id: &str) -> Option<MigrationDescriptor>;

    /// All job ids carrying the given version group tag, in dependency
    /// order.
    fn query_by_tag(&self, tag: &str) -> Vec<JobId>;

    /// Write an opaque per-job setting.
    fn set_setting(&self, id: &str, key: &str, value: &str);

    /// Read back an opaque per-job setting.
    fn setting(&self, id: &str, key: &str) -> Option<String>;
}

/// In-memory job store.
///
/// Keeps descriptors in insertion order and orders tag queries by weight,
/// falling back to insertion order for equal weights.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    descriptors: RwLock<Vec<MigrationDescriptor>>,
    settings: RwLock<HashMap<(String, String), String>>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job descriptor.
    pub fn insert(&self, descriptor: MigrationDescriptor) {
        self.descriptors.write().unwrap().push(descriptor);
    }

    /// Remove a job descriptor, if present.
    pub fn remove(&self, id: &str) {
        self.descriptors.write().unwrap().retain(|d| d.id != id);
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.read().unwrap().len()
    }

    /// Check if the store has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descriptors.read().unwrap().is_empty()
    }
}

impl JobStore for MemoryJobStore {
    fn load_descriptor(&self, id: &str) -> Option<MigrationDescriptor> {
        self.descriptors
            .read()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    fn query_by_tag(&self, tag: &str) -> Vec<JobId> {
        let mut matching: Vec<(i64, JobId)> = self
            .descriptors
            .read()
            .unwrap()
            .iter()
            .filter(|d| d.has_tag(tag))
            .map(|d| (d.weight, d.id.clone()))
            .collect();
        matching.sort_by_key(|(weight, _)| *weight);
        matching.into_iter().map(|(_, id)| id).collect()
    }

    fn set_setting(&self, id: &str, key: &str, value: &str) {
        self.settings
            .write()
            .unwrap()
            .insert((id.to_string(), key.to_string()), value.to_string());
    }

    fn setting(&self, id: &str, key: &str) -> Option<String> {
        self.settings
            .read()
            .unwrap()
            .get(&(id.to_string(), key.to_string()))
            .cloned()
    }
}
