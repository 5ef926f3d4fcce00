//! Migration catalog.
//!
//! Resolves which migration jobs apply to a detected source version and
//! carries the per-job metadata and settings the run needs.

mod catalog;
mod descriptor;
mod store;

pub use catalog::{version_tag, MigrationCatalog};
pub use descriptor::{JobId, MigrationDescriptor};
pub use store::{JobStore, MemoryJobStore, SETTING_SOURCE_BASE_PATH, SETTING_SOURCE_KEY};
