//! Sequential processing pipeline: read each downloaded PDF, extract
//! text, rank keywords, and upsert one document record per file.
//!
//! Per-file errors are recorded and processing continues; a single bad
//! PDF never aborts the batch.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::error::PdfHarvestError;
use crate::extractor;
use crate::keywords;
use crate::store::{
    document_repo, error_repo, Database, DocumentMetadata, DocumentStatus,
};

/// Counts for the end-of-run report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub failed: u64,
    pub skipped: u64,
}

pub struct Pipeline {
    db: Database,
    input_directory: PathBuf,
    analyzer: crate::config::AnalyzerConfig,
    summary_length: usize,
}

impl Pipeline {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            input_directory: PathBuf::from(&config.download_dir),
            analyzer: config.analyzer.clone(),
            summary_length: config.summary_length,
        }
    }

    /// Processes every `.pdf` file in the input directory, in name
    /// order. Files already at `processed` are skipped; `failed` ones
    /// are retried (bumping their version).
    pub fn run(&self) -> Result<RunStats, PdfHarvestError> {
        let files = self.list_pdf_files()?;
        if files.is_empty() {
            warn!("No PDF files found in {}", self.input_directory.display());
            return Ok(RunStats::default());
        }

        info!("Found {} PDF files to process", files.len());

        let mut stats = RunStats::default();
        for path in files {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                continue;
            };

            if self.already_processed(&filename)? {
                info!(filename, "Already processed, skipping");
                stats.skipped += 1;
                continue;
            }

            match self.process_file(&path, &filename) {
                Ok(()) => stats.processed += 1,
                Err(()) => stats.failed += 1,
            }
        }

        info!(
            processed = stats.processed,
            failed = stats.failed,
            skipped = stats.skipped,
            "Processing complete"
        );
        Ok(stats)
    }

    /// Runs the per-file steps. Ok means a `processed` record was
    /// written, Err(()) means the failure was recorded and the batch
    /// should move on.
    fn process_file(&self, path: &Path, filename: &str) -> Result<(), ()> {
        let _span = info_span!("pipeline", filename).entered();

        if let Err(e) = document_repo::mark_pending(&self.db, filename) {
            warn!(filename, error = %e, "Failed to mark document pending");
            return Err(());
        }

        let bytes = {
            let _step = info_span!("read_file").entered();
            match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.record_failure(filename, "io", &e.to_string());
                    return Err(());
                }
            }
        };

        let extracted = {
            let _step = info_span!("extract_text").entered();
            match extractor::extract(&bytes) {
                Ok(extracted) => extracted,
                Err(e) => {
                    self.record_failure(filename, e.kind(), &e.to_string());
                    return Err(());
                }
            }
        };

        let ranked = {
            let _step = info_span!("analyze_keywords").entered();
            keywords::analyze(&extracted.text, &self.analyzer)
        };

        let summary: String = extracted.text.chars().take(self.summary_length).collect();
        let metadata = DocumentMetadata {
            page_count: extracted.page_count as u64,
            text_length: extracted.text.chars().count() as u64,
            processed_time: Some(Utc::now()),
        };

        let _step = info_span!("store_document").entered();
        match document_repo::upsert(
            &self.db,
            filename,
            DocumentStatus::Processed,
            &summary,
            &ranked,
            &metadata,
        ) {
            Ok(version) => {
                info!(filename, version, "Processed document");
                Ok(())
            }
            Err(e) => {
                warn!(filename, error = %e, "Failed to store document");
                self.record_failure(filename, "store", &e.to_string());
                Err(())
            }
        }
    }

    /// Marks the document failed and appends to the error log. Both are
    /// best-effort: a broken error path must not abort the batch.
    fn record_failure(&self, filename: &str, error_type: &str, message: &str) {
        warn!(filename, error_type, message, "Processing failed");

        if let Err(e) = document_repo::upsert(
            &self.db,
            filename,
            DocumentStatus::Failed,
            "",
            &[],
            &DocumentMetadata::default(),
        ) {
            warn!(filename, error = %e, "Failed to record failed status");
        }

        if let Err(e) = error_repo::record_error(&self.db, filename, error_type, message) {
            warn!(filename, error = %e, "Failed to append to error log");
        }
    }

    fn already_processed(&self, filename: &str) -> Result<bool, PdfHarvestError> {
        let existing = document_repo::find_by_filename(&self.db, filename)?;
        Ok(matches!(
            existing.map(|d| d.status),
            Some(DocumentStatus::Processed)
        ))
    }

    /// `.pdf` files in the input directory, sorted by name so runs are
    /// deterministic and resume in the same order.
    fn list_pdf_files(&self) -> Result<Vec<PathBuf>, PdfHarvestError> {
        let entries =
            std::fs::read_dir(&self.input_directory).map_err(|e| PdfHarvestError::Io {
                path: self.input_directory.clone(),
                source: e,
            })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PdfHarvestError::Io {
                path: self.input_directory.clone(),
                source: e,
            })?;
            let path = entry.path();
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if path.is_file() && is_pdf {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::error_repo;
    use tempfile::TempDir;

    fn test_config(dir: &Path) -> Config {
        Config {
            download_dir: dir.to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    fn write_valid_pdf(dir: &Path, name: &str, text: &str) {
        let bytes = crate::extractor::tests::build_pdf(text);
        std::fs::write(dir.join(name), bytes).unwrap();
    }

    #[test]
    fn test_run_empty_directory() {
        let dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db, &test_config(dir.path()));

        let stats = pipeline.run().unwrap();
        assert_eq!(stats, RunStats::default());
    }

    #[test]
    fn test_run_missing_directory_is_error() {
        let db = Database::open_in_memory().unwrap();
        let mut config = Config::default();
        config.download_dir = "/nonexistent/pdf_downloads".to_string();
        let pipeline = Pipeline::new(db, &config);

        assert!(pipeline.run().is_err());
    }

    #[test]
    fn test_process_valid_pdf() {
        let dir = TempDir::new().unwrap();
        write_valid_pdf(dir.path(), "pdf01.pdf", "invoice invoice payment");

        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db.clone(), &test_config(dir.path()));

        let stats = pipeline.run().unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.failed, 0);

        let doc = document_repo::find_by_filename(&db, "pdf01.pdf")
            .unwrap()
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Processed);
        assert_eq!(doc.version, 1);
        assert_eq!(doc.metadata.page_count, 1);
        assert!(doc.metadata.text_length > 0);
        assert!(doc.keywords.iter().any(|k| k.word == "invoice"));
    }

    #[test]
    fn test_corrupt_pdf_marked_failed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pdf01.pdf"), b"not a pdf at all").unwrap();

        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db.clone(), &test_config(dir.path()));

        let stats = pipeline.run().unwrap();
        assert_eq!(stats.failed, 1);

        let doc = document_repo::find_by_filename(&db, "pdf01.pdf")
            .unwrap()
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert_eq!(doc.version, 1);

        let errors = error_repo::list_for(&db, "pdf01.pdf").unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, "corrupt");
    }

    #[test]
    fn test_bad_file_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pdf01.pdf"), b"garbage").unwrap();
        write_valid_pdf(dir.path(), "pdf02.pdf", "useful content here");

        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db.clone(), &test_config(dir.path()));

        let stats = pipeline.run().unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processed, 1);
    }

    #[test]
    fn test_processed_files_skipped_on_rerun() {
        let dir = TempDir::new().unwrap();
        write_valid_pdf(dir.path(), "pdf01.pdf", "stable content");

        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db.clone(), &test_config(dir.path()));

        pipeline.run().unwrap();
        let stats = pipeline.run().unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.processed, 0);

        // Version unchanged by the skip.
        let doc = document_repo::find_by_filename(&db, "pdf01.pdf")
            .unwrap()
            .unwrap();
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn test_failed_files_retried_with_version_bump() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pdf01.pdf"), b"still not a pdf").unwrap();

        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db.clone(), &test_config(dir.path()));

        pipeline.run().unwrap();
        // Replace the file with a valid one; retry should succeed.
        write_valid_pdf(dir.path(), "pdf01.pdf", "fixed now");
        let stats = pipeline.run().unwrap();

        assert_eq!(stats.processed, 1);
        let doc = document_repo::find_by_filename(&db, "pdf01.pdf")
            .unwrap()
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Processed);
        assert_eq!(doc.version, 2);
    }

    #[test]
    fn test_summary_truncated_to_config_length() {
        let dir = TempDir::new().unwrap();
        let long_text = "word ".repeat(500);
        write_valid_pdf(dir.path(), "pdf01.pdf", &long_text);

        let db = Database::open_in_memory().unwrap();
        let mut config = test_config(dir.path());
        config.summary_length = 50;
        let pipeline = Pipeline::new(db.clone(), &config);

        pipeline.run().unwrap();
        let doc = document_repo::find_by_filename(&db, "pdf01.pdf")
            .unwrap()
            .unwrap();
        assert!(doc.summary.chars().count() <= 50);
    }

    #[test]
    fn test_non_pdf_files_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not processed").unwrap();
        write_valid_pdf(dir.path(), "pdf01.pdf", "real document");

        let db = Database::open_in_memory().unwrap();
        let pipeline = Pipeline::new(db.clone(), &test_config(dir.path()));

        let stats = pipeline.run().unwrap();
        assert_eq!(stats.processed, 1);
        assert!(document_repo::find_by_filename(&db, "notes.txt")
            .unwrap()
            .is_none());
    }
}
