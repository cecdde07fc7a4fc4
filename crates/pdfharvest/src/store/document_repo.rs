//! Document repository — one record per processed PDF.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::keywords::Keyword;

use super::{status_repo, Database, DatabaseError};

/// Processing state of a document.
///
/// Transitions: `pending -> processed | failed`; a `failed` document may
/// be retried back into `processed` or `failed`. The version counter is
/// bumped on every attempt that reaches [`upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processed => "processed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(DocumentStatus::Pending),
            "processed" => Some(DocumentStatus::Processed),
            "failed" => Some(DocumentStatus::Failed),
            _ => None,
        }
    }
}

/// Extraction metadata stored alongside the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub page_count: u64,
    pub text_length: u64,
    pub processed_time: Option<DateTime<Utc>>,
}

/// The per-file record: status, summary, ranked keywords, extraction
/// metadata, and a version counter incremented on each attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub filename: String,
    pub status: DocumentStatus,
    pub summary: String,
    pub keywords: Vec<Keyword>,
    pub metadata: DocumentMetadata,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessedDocument {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let keywords_json: String = row.get("keywords")?;
        let keywords: Vec<Keyword> = serde_json::from_str(&keywords_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let status_raw: String = row.get("status")?;
        let status = DocumentStatus::parse(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown status '{}'", status_raw).into(),
            )
        })?;

        Ok(Self {
            filename: row.get("filename")?,
            status,
            summary: row.get("summary")?,
            keywords,
            metadata: DocumentMetadata {
                page_count: row.get("page_count")?,
                text_length: row.get("text_length")?,
                processed_time: parse_timestamp_opt(row.get("processed_time")?),
            },
            version: row.get("version")?,
            created_at: parse_timestamp(row.get("created_at")?),
            updated_at: parse_timestamp(row.get("updated_at")?),
        })
    }

    /// True when the keyword list contains `word`, case-insensitively.
    pub fn has_keyword(&self, word: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| k.word.eq_ignore_ascii_case(word))
    }
}

fn parse_timestamp(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn parse_timestamp_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Query filter. Empty filter matches everything.
#[derive(Debug, Default, Clone)]
pub struct DocumentFilter {
    /// Case-insensitive exact match against keyword list membership.
    pub keyword: Option<String>,
    /// Case-insensitive status match.
    pub status: Option<String>,
}

/// Creates the document row in `pending` state if absent. Never bumps
/// the version of an existing row, so a crash between marking and
/// finishing does not consume a version number.
pub fn mark_pending(db: &Database, filename: &str) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO documents (filename, status, version, created_at, updated_at)
             VALUES (?1, 'pending', 0, ?2, ?2)",
            params![filename, now],
        )?;
        status_repo::stamp(conn, filename, DocumentStatus::Pending.as_str(), &now)?;
        Ok(())
    })
}

/// Inserts or overwrites the record for `filename`, returning the new
/// version. First successful call for a filename yields version 1;
/// every later call increments by exactly 1. `filename` and
/// `created_at` are preserved across attempts.
pub fn upsert(
    db: &Database,
    filename: &str,
    status: DocumentStatus,
    summary: &str,
    keywords: &[Keyword],
    metadata: &DocumentMetadata,
) -> Result<i64, DatabaseError> {
    let keywords_json =
        serde_json::to_string(keywords).map_err(|e| DatabaseError::Serialize(e.to_string()))?;
    let now = Utc::now().to_rfc3339();
    let processed_time = metadata.processed_time.map(|t| t.to_rfc3339());

    db.with_conn(|conn| {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT version FROM documents WHERE filename = ?1",
                params![filename],
                |r| r.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let version = match existing {
            None => {
                conn.execute(
                    "INSERT INTO documents (filename, status, summary, keywords, page_count,
                     text_length, processed_time, version, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)",
                    params![
                        filename,
                        status.as_str(),
                        summary,
                        keywords_json,
                        metadata.page_count,
                        metadata.text_length,
                        processed_time,
                        now,
                    ],
                )?;
                1
            }
            Some(v) => {
                let next = v + 1;
                conn.execute(
                    "UPDATE documents SET status=?2, summary=?3, keywords=?4, page_count=?5,
                     text_length=?6, processed_time=?7, version=?8, updated_at=?9
                     WHERE filename=?1",
                    params![
                        filename,
                        status.as_str(),
                        summary,
                        keywords_json,
                        metadata.page_count,
                        metadata.text_length,
                        processed_time,
                        next,
                        now,
                    ],
                )?;
                next
            }
        };

        status_repo::stamp(conn, filename, status.as_str(), &now)?;
        Ok(version)
    })
}

/// Finds a document by filename.
pub fn find_by_filename(
    db: &Database,
    filename: &str,
) -> Result<Option<ProcessedDocument>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE filename = ?1")?;
        let mut rows = stmt.query_map(params![filename], ProcessedDocument::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries documents. Status is filtered in SQL; keyword membership is
/// checked against the deserialized keyword list, so matching stays
/// consistent with what the analyzer actually stored.
pub fn query(
    db: &Database,
    filter: &DocumentFilter,
) -> Result<Vec<ProcessedDocument>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let docs: Vec<ProcessedDocument> = match &filter.status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM documents WHERE lower(status) = lower(?1)
                     ORDER BY created_at DESC, filename ASC",
                )?;
                let rows = stmt.query_map(params![status], ProcessedDocument::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT * FROM documents ORDER BY created_at DESC, filename ASC")?;
                let rows = stmt.query_map([], ProcessedDocument::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(docs)
    })?;

    Ok(match &filter.keyword {
        Some(keyword) => rows
            .into_iter()
            .filter(|d| d.has_keyword(keyword))
            .collect(),
        None => rows,
    })
}
