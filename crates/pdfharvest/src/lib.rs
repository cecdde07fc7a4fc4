pub mod config;
pub mod dataset;
pub mod downloader;
pub mod extractor;
pub mod fetcher;
pub mod keywords;
pub mod logging;
pub mod namer;
pub mod pipeline;
pub mod store;
pub mod web;

pub mod error;

pub use config::{load_config, Config};
pub use dataset::DatasetEntry;
pub use downloader::{Downloader, DownloadStats};
pub use error::{ConfigError, ExtractError, FetchError, PdfHarvestError, Result};
pub use extractor::ExtractedText;
pub use fetcher::{Fetcher, RetryPolicy};
pub use keywords::{analyze, Keyword};
pub use namer::SequentialNamer;
pub use pipeline::{Pipeline, RunStats};
pub use store::{Database, DocumentFilter, ProcessedDocument};
