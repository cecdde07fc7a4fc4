//! Append-only error log keyed by filename.

use chrono::Utc;
use rusqlite::params;

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct ErrorRow {
    pub filename: String,
    pub error_type: String,
    pub message: String,
    pub timestamp: String,
}

/// Appends an error entry. Callers treat failures here as non-fatal:
/// the error log must never take down the batch it is reporting on.
pub fn record_error(
    db: &Database,
    filename: &str,
    error_type: &str,
    message: &str,
) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO errors (filename, error_type, message, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![filename, error_type, message, now],
        )?;
        Ok(())
    })
}

/// All error entries for a filename, oldest first.
pub fn list_for(db: &Database, filename: &str) -> Result<Vec<ErrorRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT filename, error_type, message, timestamp FROM errors
             WHERE filename = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![filename], |row| {
            Ok(ErrorRow {
                filename: row.get(0)?,
                error_type: row.get(1)?,
                message: row.get(2)?,
                timestamp: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    })
}

/// Total number of logged errors.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let n: u64 = conn.query_row("SELECT COUNT(*) FROM errors", [], |r| r.get(0))?;
        Ok(n)
    })
}
