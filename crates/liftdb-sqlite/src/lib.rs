//! SQLite schema probe for liftdb.
//!
//! Lets version detection run against a SQLite copy of the source database,
//! which is how site snapshots usually arrive for inspection.

use liftdb_core::{ProbeError, SchemaProbe};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

/// Schema probe over a SQLite connection.
///
/// `rusqlite::Connection` is not `Sync`; the probe serializes access with a
/// mutex, which matches the engine's single-threaded model.
pub struct SqliteProbe {
    conn: Mutex<Connection>,
}

impl SqliteProbe {
    /// Wrap an open connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open a source database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        Ok(Self::new(Connection::open(path)?))
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Ok(Self::new(Connection::open_in_memory()?))
    }
}

impl SchemaProbe for SqliteProbe {
    fn table_exists(&self, name: &str) -> Result<bool, ProbeError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(|e| ProbeError::new(e.to_string()))?;
        Ok(count > 0)
    }

    fn query_scalar(&self, sql: &str, params: &[&str]) -> Result<Option<String>, ProbeError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql).map_err(|e| ProbeError::new(e.to_string()))?;
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter().copied()))
            .map_err(|e| ProbeError::new(e.to_string()))?;

        let Some(row) = rows.next().map_err(|e| ProbeError::new(e.to_string()))? else {
            return Ok(None);
        };
        let value: Value = row
            .get(0)
            .map_err(|e| ProbeError::new(e.to_string()))?;

        Ok(match value {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Text(s) => Some(s),
            Value::Blob(_) => return Err(ProbeError::new("unexpected blob value")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftdb_core::{detect_source_version, VersionMarker};

    fn probe_with_schema(statements: &[&str]) -> SqliteProbe {
        let conn = Connection::open_in_memory().unwrap();
        for statement in statements {
            conn.execute(statement, []).unwrap();
        }
        SqliteProbe::new(conn)
    }

    #[test]
    fn test_table_exists() {
        let probe = probe_with_schema(&["CREATE TABLE system (name TEXT, schema_version INTEGER)"]);
        assert!(probe.table_exists("system").unwrap());
        assert!(!probe.table_exists("missing").unwrap());
    }

    #[test]
    fn test_query_scalar_reads_integer_as_text() {
        let probe = probe_with_schema(&[
            "CREATE TABLE system (name TEXT, schema_version INTEGER)",
            "INSERT INTO system VALUES ('system', 1008)",
        ]);

        let value = probe
            .query_scalar("SELECT schema_version FROM system WHERE name = ?", &["system"])
            .unwrap();
        assert_eq!(value.as_deref(), Some("1008"));
    }

    #[test]
    fn test_query_scalar_no_rows_is_none() {
        let probe = probe_with_schema(&["CREATE TABLE system (name TEXT, schema_version INTEGER)"]);

        let value = probe
            .query_scalar("SELECT schema_version FROM system WHERE name = ?", &["system"])
            .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_query_scalar_bad_sql_is_probe_error() {
        let probe = probe_with_schema(&[]);
        assert!(probe.query_scalar("SELECT nope FROM nowhere", &[]).is_err());
    }

    #[test]
    fn test_detects_version_6_schema() {
        let probe = probe_with_schema(&[
            "CREATE TABLE system (name TEXT, schema_version INTEGER)",
            "CREATE TABLE menu_router (path TEXT)",
        ]);
        assert_eq!(detect_source_version(&probe), VersionMarker::Detected(6));
    }

    #[test]
    fn test_detects_version_7_schema() {
        let probe = probe_with_schema(&[
            "CREATE TABLE system (name TEXT, schema_version INTEGER)",
            "CREATE TABLE filter_format (format TEXT)",
        ]);
        assert_eq!(detect_source_version(&probe), VersionMarker::Detected(7));
    }

    #[test]
    fn test_detects_version_5_schema() {
        let probe = probe_with_schema(&[
            "CREATE TABLE system (name TEXT, schema_version INTEGER)",
            "INSERT INTO system VALUES ('system', 1008)",
        ]);
        assert_eq!(detect_source_version(&probe), VersionMarker::Detected(5));
    }

    #[test]
    fn test_newest_generation_wins_over_router_table() {
        let probe = probe_with_schema(&[
            "CREATE TABLE key_value (collection TEXT, name TEXT, value BLOB)",
            "CREATE TABLE menu_router (path TEXT)",
        ]);
        match detect_source_version(&probe) {
            VersionMarker::Unsupported(reason) => {
                assert!(reason.contains("not supported"));
            }
            other => panic!("expected unsupported, got {other}"),
        }
    }

    #[test]
    fn test_empty_database_is_unrecognized() {
        let probe = probe_with_schema(&[]);
        match detect_source_version(&probe) {
            VersionMarker::Unsupported(reason) => {
                assert!(reason.contains("recognizable"));
            }
            other => panic!("expected unsupported, got {other}"),
        }
    }
}
