//! Source version detection.
//!
//! Classifies an unknown source database into a supported platform
//! generation by probing for marker tables. The probe order is load-bearing,
//! not incidental: the newest generation's schema reintroduces a table name
//! that doubles as a legacy signature, so its own marker must be checked
//! before any legacy check runs.

use crate::probe::{ProbeError, SchemaProbe};

/// Generic key-value store table introduced by the newest platform
/// generation. Its presence means the source is already current.
const KEY_VALUE_TABLE: &str = "key_value";

/// Filter format table, first present in version 7.
const FILTER_FORMAT_TABLE: &str = "filter_format";

/// Router table present in version 6. The newest generation reintroduces
/// this name, which is why the key-value check must run first.
const MENU_ROUTER_TABLE: &str = "menu_router";

/// Module registry table shared by the oldest supported generations.
const SYSTEM_TABLE: &str = "system";

/// Query for the schema version recorded for the system module.
const SYSTEM_VERSION_SQL: &str = "SELECT schema_version FROM system WHERE name = ?";

/// Rejection reason for a source that is already on the newest generation.
const TOO_NEW: &str = "upgrade from this version is not supported";

/// Rejection reason for a source with no recognizable schema markers.
const UNRECOGNIZED: &str = "source database does not contain a recognizable installation";

/// Classification of a source database.
///
/// Computed once, before any checkpoint exists, and never mutated; the
/// catalog resolves the job queue from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMarker {
    /// The source is a recognized installation of the given version.
    Detected(u32),
    /// The source cannot be upgraded, with a human-readable reason.
    Unsupported(String),
}

impl VersionMarker {
    /// The detected version number, if any.
    pub fn version(&self) -> Option<u32> {
        match self {
            VersionMarker::Detected(version) => Some(*version),
            VersionMarker::Unsupported(_) => None,
        }
    }
}

impl std::fmt::Display for VersionMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionMarker::Detected(version) => write!(f, "version {version}"),
            VersionMarker::Unsupported(reason) => write!(f, "unsupported ({reason})"),
        }
    }
}

/// Detect the source version from schema markers.
///
/// The checks form a priority-ordered decision tree:
///
/// 1. A key-value store table marks the newest generation: `Unsupported`.
/// 2. A filter format table marks version 7.
/// 3. A router table marks version 6.
/// 4. A system table with a schema version starting in `1` marks version 5.
/// 5. Anything else is `Unsupported`.
///
/// Probe failures are folded into `Unsupported` with the underlying error
/// text; this function never panics and never propagates an error.
pub fn detect_source_version(probe: &dyn SchemaProbe) -> VersionMarker {
    match try_detect(probe) {
        Ok(marker) => marker,
        Err(e) => VersionMarker::Unsupported(e.to_string()),
    }
}

fn try_detect(probe: &dyn SchemaProbe) -> Result<VersionMarker, ProbeError> {
    if probe.table_exists(KEY_VALUE_TABLE)? {
        return Ok(VersionMarker::Unsupported(TOO_NEW.to_string()));
    }
    if probe.table_exists(FILTER_FORMAT_TABLE)? {
        return Ok(VersionMarker::Detected(7));
    }
    if probe.table_exists(MENU_ROUTER_TABLE)? {
        return Ok(VersionMarker::Detected(6));
    }
    if probe.table_exists(SYSTEM_TABLE)? {
        // Known limitation: some 4.x installs also record a schema version
        // with a leading 1 and are misidentified as version 5.
        if let Some(version) = probe.query_scalar(SYSTEM_VERSION_SQL, &["system"])? {
            if version.starts_with('1') {
                return Ok(VersionMarker::Detected(5));
            }
        }
    }
    Ok(VersionMarker::Unsupported(UNRECOGNIZED.to_string()))
}
