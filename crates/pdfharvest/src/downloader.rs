//! Batch downloader: walks the dataset in order, fetches each URL, and
//! writes the payload under the next sequential name.
//!
//! Failures are logged to the error table and the batch continues. A
//! polite delay separates consecutive fetches.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::dataset::{self, DatasetEntry};
use crate::error::PdfHarvestError;
use crate::fetcher::Fetcher;
use crate::namer::SequentialNamer;
use crate::store::{download_repo, error_repo, Database};

/// Counts for the end-of-run report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: u64,
    pub failed: u64,
}

pub struct Downloader {
    db: Database,
    fetcher: Fetcher,
    namer: SequentialNamer,
    download_dir: PathBuf,
    dataset_path: PathBuf,
    polite_delay: Duration,
}

impl Downloader {
    pub fn new(db: Database, config: &Config) -> Result<Self, PdfHarvestError> {
        let fetcher = Fetcher::from_config(config)?;
        Ok(Self {
            db,
            fetcher,
            namer: SequentialNamer::new(&config.download_dir),
            download_dir: PathBuf::from(&config.download_dir),
            dataset_path: PathBuf::from(&config.dataset_path),
            polite_delay: Duration::from_secs(config.fetch.polite_delay_secs),
        })
    }

    /// Downloads every dataset entry, in logical-id order. Missing
    /// download directory is created; a missing dataset file is fatal.
    pub async fn run(&self) -> Result<DownloadStats, PdfHarvestError> {
        let entries = dataset::load(&self.dataset_path)?;
        if entries.is_empty() {
            warn!("Dataset at {} is empty", self.dataset_path.display());
            return Ok(DownloadStats::default());
        }

        std::fs::create_dir_all(&self.download_dir).map_err(|e| PdfHarvestError::Io {
            path: self.download_dir.clone(),
            source: e,
        })?;

        info!("Downloading {} PDFs", entries.len());

        let mut stats = DownloadStats::default();
        for (i, entry) in entries.iter().enumerate() {
            match self.download_entry(entry).await {
                Ok(()) => stats.downloaded += 1,
                Err(()) => stats.failed += 1,
            }

            if i + 1 < entries.len() && !self.polite_delay.is_zero() {
                tokio::time::sleep(self.polite_delay).await;
            }
        }

        info!(
            downloaded = stats.downloaded,
            failed = stats.failed,
            "Download complete"
        );
        Ok(stats)
    }

    /// Fetches one entry and writes it to disk. Err(()) means the
    /// failure was recorded and the batch should move on.
    async fn download_entry(&self, entry: &DatasetEntry) -> Result<(), ()> {
        info!(id = %entry.logical_id, url = %entry.url, "Fetching");

        let bytes = match self.fetcher.fetch(&entry.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "Download failed");
                self.record_failure(&entry.logical_id, e.kind(), &e.to_string());
                return Err(());
            }
        };

        // Name is assigned only after a successful fetch, so failures
        // never burn an ordinal.
        let filename = match self.namer.next_name() {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Could not derive next filename");
                self.record_failure(&entry.logical_id, "io", &e.to_string());
                return Err(());
            }
        };

        let path = self.download_dir.join(&filename);
        if let Err(e) = std::fs::write(&path, &bytes) {
            warn!(path = %path.display(), error = %e, "Failed to write PDF");
            self.record_failure(&entry.logical_id, "io", &e.to_string());
            return Err(());
        }

        if let Err(e) = download_repo::record(&self.db, &filename, &entry.url, bytes.len() as u64)
        {
            warn!(filename, error = %e, "Failed to record download");
        }

        info!(filename, bytes = bytes.len(), "Downloaded");
        Ok(())
    }

    // Best-effort; a broken error log must not abort the batch.
    fn record_failure(&self, logical_id: &str, error_type: &str, message: &str) {
        if let Err(e) = error_repo::record_error(&self.db, logical_id, error_type, message) {
            warn!(logical_id, error = %e, "Failed to append to error log");
        }
    }
}
