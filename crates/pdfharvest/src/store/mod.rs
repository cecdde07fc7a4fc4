//! Document store backed by SQLite.
//!
//! Uses rusqlite with a thread-safe `Database` handle. All access is
//! serialized through a `Mutex<Connection>`, which is fine for SQLite
//! (which serializes writes anyway). One `documents` row per filename,
//! a `processing_status` transition stamp per filename, an append-only
//! `errors` log, and download provenance in `downloads`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod document_repo;
pub mod download_repo;
pub mod error;
pub mod error_repo;
pub mod migrations;
pub mod status_repo;

pub use document_repo::{DocumentFilter, DocumentMetadata, DocumentStatus, ProcessedDocument};
pub use error::DatabaseError;

/// Thread-safe database handle wrapping a single rusqlite connection.
/// Cloning is cheap (inner `Arc`).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations. Failure here is fatal for a run: nothing can
    /// be processed without persistence.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Document store opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Aggregate counts over the `documents` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total: u64,
    pub processed: u64,
    pub failed: u64,
    pub pending: u64,
}

/// Returns processing statistics for the end-of-run report.
pub fn stats(db: &Database) -> Result<StoreStats, DatabaseError> {
    db.with_conn(|conn| {
        let count = |status: Option<&str>| -> Result<u64, rusqlite::Error> {
            match status {
                Some(s) => conn.query_row(
                    "SELECT COUNT(*) FROM documents WHERE status = ?1",
                    rusqlite::params![s],
                    |r| r.get(0),
                ),
                None => conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0)),
            }
        };

        Ok(StoreStats {
            total: count(None)?,
            processed: count(Some("processed"))?,
            failed: count(Some("failed"))?,
            pending: count(Some("pending"))?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_open_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(&path).unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_database_is_clone() {
        let db = Database::open_in_memory().unwrap();
        let db2 = db.clone();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (filename, status, version, created_at, updated_at)
                 VALUES ('pdf01.pdf', 'pending', 0, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db2.with_conn(|conn| {
            let count: u32 = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
            assert_eq!(count, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_stats_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let s = stats(&db).unwrap();
        assert_eq!(s.total, 0);
        assert_eq!(s.processed, 0);
        assert_eq!(s.failed, 0);
        assert_eq!(s.pending, 0);
    }
}
