//! Processing status stamps — the last transition per filename.
//!
//! Kept separate from `documents.status` deliberately: `documents` is
//! the authoritative record, this table is a lightweight stamp of the
//! most recent transition attempt and its time, cheap to scan for
//! monitoring without touching document payloads.

use rusqlite::{params, Connection};

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct StatusStamp {
    pub filename: String,
    pub status: String,
    pub timestamp: String,
}

/// Writes (or replaces) the stamp for a filename. Takes a raw
/// connection so document operations can stamp within their own
/// `with_conn` scope.
pub fn stamp(
    conn: &Connection,
    filename: &str,
    status: &str,
    timestamp: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO processing_status (filename, status, timestamp)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(filename) DO UPDATE SET status=?2, timestamp=?3",
        params![filename, status, timestamp],
    )?;
    Ok(())
}

/// Reads the stamp for a filename.
pub fn get(db: &Database, filename: &str) -> Result<Option<StatusStamp>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT filename, status, timestamp FROM processing_status WHERE filename = ?1")?;
        let mut rows = stmt.query_map(params![filename], |row| {
            Ok(StatusStamp {
                filename: row.get(0)?,
                status: row.get(1)?,
                timestamp: row.get(2)?,
            })
        })?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
