//! Downloads every PDF in the dataset to the download directory.

use pdfharvest::downloader::Downloader;
use pdfharvest::store::Database;
use pdfharvest::{config, logging};

#[tokio::main]
async fn main() {
    logging::init();

    let config = match config::load_config(config::CONFIG_FILENAME) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            std::process::exit(1);
        }
    };

    let downloader = match Downloader::new(db, &config) {
        Ok(downloader) => downloader,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build downloader");
            std::process::exit(1);
        }
    };

    match downloader.run().await {
        Ok(stats) => {
            println!(
                "Downloaded {} PDF(s), {} failed",
                stats.downloaded, stats.failed
            );
            if stats.failed > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Download run failed");
            std::process::exit(1);
        }
    }
}
