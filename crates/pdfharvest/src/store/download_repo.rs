//! Download provenance — which URL produced which local file.

use chrono::Utc;
use rusqlite::params;

use super::{Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct DownloadRow {
    pub filename: String,
    pub source_url: String,
    pub byte_size: u64,
    pub downloaded_at: String,
}

/// Records a successful download. Replaces any previous row for the
/// same filename (a re-download of the same sequential name).
pub fn record(
    db: &Database,
    filename: &str,
    source_url: &str,
    byte_size: u64,
) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO downloads (filename, source_url, byte_size, downloaded_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(filename) DO UPDATE SET source_url=?2, byte_size=?3, downloaded_at=?4",
            params![filename, source_url, byte_size, now],
        )?;
        Ok(())
    })
}

/// Looks up the source URL for a local filename.
pub fn find_by_filename(
    db: &Database,
    filename: &str,
) -> Result<Option<DownloadRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT filename, source_url, byte_size, downloaded_at FROM downloads
             WHERE filename = ?1",
        )?;
        let mut rows = stmt.query_map(params![filename], |row| {
            Ok(DownloadRow {
                filename: row.get(0)?,
                source_url: row.get(1)?,
                byte_size: row.get(2)?,
                downloaded_at: row.get(3)?,
            })
        })?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
