//! Non-interactive upgrade runner.
//!
//! Drives the same pipeline an embedding UI would: detect the source
//! version, resolve and configure the eligible jobs, then run them to
//! completion in-process. Hosts with an external scheduler call the batch
//! engine tick by tick instead and only use [`UpgradeRunner::configure`].

use crate::batch::{BatchEngine, Checkpoint, Summary};
use crate::catalog::{JobId, JobStore, MigrationCatalog, SETTING_SOURCE_BASE_PATH, SETTING_SOURCE_KEY};
use crate::detect::{detect_source_version, VersionMarker};
use crate::error::Error;
use crate::executor::{JobExecutor, Logger, MessageCapture};
use crate::probe::SchemaProbe;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Connection-independent settings for one upgrade run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Address of the source site, used by file-importing jobs to retrieve
    /// public files (e.g. `http://example.com`).
    pub site_address: Option<String>,
}

/// Configures and drives a complete upgrade run.
pub struct UpgradeRunner {
    store: Arc<dyn JobStore>,
    logger: Arc<dyn Logger>,
}

impl UpgradeRunner {
    /// Create a runner over the given job store and logger.
    pub fn new(store: Arc<dyn JobStore>, logger: Arc<dyn Logger>) -> Self {
        Self { store, logger }
    }

    /// Detect the source version and configure the eligible jobs.
    ///
    /// Every resolved job gets its source key setting (`upgrade<N>` for a
    /// detected version N); jobs that import files additionally get the
    /// base path derived from the site address, normalized to exactly one
    /// trailing slash. Returns the ordered job queue.
    ///
    /// Fails with [`Error::UnsupportedSource`] when detection rejects the
    /// source and with [`Error::NoUpgradePath`] when no jobs are registered
    /// for the detected version.
    pub fn configure(
        &self,
        probe: &dyn SchemaProbe,
        config: &SourceConfig,
    ) -> Result<Vec<JobId>, Error> {
        let version = match detect_source_version(probe) {
            VersionMarker::Detected(version) => version,
            VersionMarker::Unsupported(reason) => {
                return Err(Error::UnsupportedSource { reason })
            }
        };

        let catalog = self.catalog();
        let ids = catalog.resolve(version);
        if ids.is_empty() {
            return Err(Error::NoUpgradePath { version });
        }

        let source_key = format!("upgrade{version}");
        let base_path = config.site_address.as_deref().map(normalize_base_path);
        for id in &ids {
            self.store.set_setting(id, SETTING_SOURCE_KEY, &source_key);
            if let Some(path) = &base_path {
                if let Some(descriptor) = self.store.load_descriptor(id) {
                    if descriptor.handles_files {
                        self.store.set_setting(id, SETTING_SOURCE_BASE_PATH, path);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// Run a configured job queue to completion and summarize it.
    pub fn import(&self, executor: Box<dyn JobExecutor>, ids: Vec<JobId>) -> Result<Summary, Error> {
        let mut engine = BatchEngine::new(self.catalog(), executor, Arc::clone(&self.logger));
        let mut checkpoint = Checkpoint::new(ids);
        while !checkpoint.is_finished() {
            engine.tick(&mut checkpoint)?;
        }
        Ok(engine.finish(&checkpoint))
    }

    /// Roll back every job registered for a version, in reverse dependency
    /// order. Jobs missing from the store are skipped.
    pub fn rollback(&self, executor: &mut dyn JobExecutor, version: u32) -> Result<(), Error> {
        let catalog = self.catalog();
        let ids = catalog.resolve(version);
        if ids.is_empty() {
            return Err(Error::NoUpgradePath { version });
        }

        for id in ids.iter().rev() {
            let Some(job) = catalog.descriptor(id) else {
                continue;
            };
            self.logger
                .notice(&format!("Rolling back {}", job.display_name()));
            let mut capture = MessageCapture::new();
            executor.rollback(&job, &mut capture);
            for message in capture.drain() {
                self.logger.notice(&message);
            }
        }

        Ok(())
    }

    fn catalog(&self) -> MigrationCatalog {
        MigrationCatalog::new(Arc::clone(&self.store))
    }
}

/// Normalize a site address to exactly one trailing slash.
fn normalize_base_path(address: &str) -> String {
    format!("{}/", address.trim_end_matches('/'))
}
