//! Audit log: SQLite-based operation history.
//!
//! Every mutating command records a row in `audit.db`, stored in the same
//! directory as the vault file.  Rows hold operation names and account or
//! group names, never passwords.
//!
//! If the database can't be opened or written to, the vault operation
//! carries on without logging.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::errors::{Result, VaultError};

/// File name of the audit database.
const DB_FILE: &str = "audit.db";

/// A single audit log entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub target: Option<String>,
    pub details: Option<String>,
}

/// SQLite-backed audit log.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) `<dir>/audit.db`.
    ///
    /// Returns `None` if the database can't be opened.
    pub fn open(dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(dir);
        let conn = match Connection::open(&db_path) {
            Ok(conn) => conn,
            Err(e) => {
                debug!(path = %db_path.display(), error = %e, "audit log unavailable");
                return None;
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp   TEXT NOT NULL,
                operation   TEXT NOT NULL,
                target      TEXT,
                details     TEXT
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    /// Record an operation.  Errors are ignored.
    pub fn log(&self, operation: &str, target: Option<&str>, details: Option<&str>) {
        let now = Utc::now().to_rfc3339();
        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, operation, target, details)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![now, operation, target, details],
        );
    }

    /// Most recent entries first, at most `limit`, optionally only those
    /// at or after `since`.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        // RFC 3339 strings in UTC compare correctly as text.
        let since = since.map(|ts| ts.to_rfc3339());

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, operation, target, details
                 FROM audit_log
                 WHERE ?1 IS NULL OR timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| VaultError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since, limit], |row| {
                let ts: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map_or_else(|_| DateTime::<Utc>::UNIX_EPOCH, |dt| dt.with_timezone(&Utc));

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    operation: row.get(2)?,
                    target: row.get(3)?,
                    details: row.get(4)?,
                })
            })
            .map_err(|e| VaultError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| VaultError::AuditError(format!("row parse: {e}")))?);
        }
        Ok(entries)
    }

    pub fn db_path(dir: &Path) -> PathBuf {
        dir.join(DB_FILE)
    }
}

/// Directory that holds the audit database for `vault_path`.
pub fn audit_dir(vault_path: &Path) -> PathBuf {
    match vault_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Log an event next to the vault at `vault_path`.  Never fails.
pub fn log_audit(vault_path: &Path, operation: &str, target: Option<&str>, details: Option<&str>) {
    if let Some(audit) = AuditLog::open(&audit_dir(vault_path)) {
        audit.log(operation, target, details);
    }
}
