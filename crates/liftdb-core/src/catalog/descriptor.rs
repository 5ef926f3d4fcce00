//! Migration job metadata.

use serde::{Deserialize, Serialize};

/// Opaque, order-bearing identifier of one migration job.
pub type JobId = String;

/// Metadata describing one migration job.
///
/// Resolved once at catalog-resolution time and read-only afterwards. The
/// engine only ever reads the identifier and label; everything else is for
/// the catalog and the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationDescriptor {
    /// Stable job identifier.
    pub id: JobId,
    /// Human-readable label; the id stands in when this is empty.
    pub label: String,
    /// Version group tags this job belongs to.
    pub tags: Vec<String>,
    /// Dependency position assigned by the job store. The store's query
    /// order already reflects it; the value is carried for inspection.
    pub weight: i64,
    /// Whether the job copies files from the source site and needs a base
    /// path configured before the run.
    pub handles_files: bool,
}

impl MigrationDescriptor {
    /// Create a descriptor with no tags and default weight.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tags: Vec::new(),
            weight: 0,
            handles_files: false,
        }
    }

    /// Add a version group tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the dependency position.
    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    /// Mark the job as importing files from the source site.
    pub fn with_files(mut self) -> Self {
        self.handles_files = true;
        self
    }

    /// Whether the job carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Name to show in status messages: the label, or the id when no label
    /// was provided.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}
