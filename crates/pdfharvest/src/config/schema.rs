use serde::{Deserialize, Serialize};

/// Top-level configuration, read from `pdfharvest.json` in the working
/// directory. Every field has a default so the file may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the dataset mapping logical ids to URLs.
    pub dataset_path: String,
    /// Directory downloaded PDFs are written to and processed from.
    pub download_dir: String,
    /// SQLite database file.
    pub database_path: String,
    /// Verify TLS certificates on fetch.
    pub verify_tls: bool,
    /// Domains fetched without certificate verification even when
    /// `verify_tls` is true. Some upstream servers ship broken chains.
    pub insecure_domains: Vec<String>,
    pub fetch: FetchConfig,
    pub analyzer: AnalyzerConfig,
    /// Number of leading characters of extracted text kept as summary.
    pub summary_length: usize,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: "Dataset.json".to_string(),
            download_dir: "pdf_downloads".to_string(),
            database_path: "pdfharvest.db".to_string(),
            verify_tls: true,
            insecure_domains: Vec::new(),
            fetch: FetchConfig::default(),
            analyzer: AnalyzerConfig::default(),
            summary_length: 500,
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_attempts: u32,
    /// Seconds between retry attempts for the same URL.
    pub retry_delay_secs: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Seconds between consecutive downloads. Rate limiting, not tuning.
    pub polite_delay_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 2,
            timeout_secs: 30,
            polite_delay_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Number of top-ranked keywords kept per document.
    pub top_k: usize,
    /// Tokens shorter than this are discarded.
    pub min_word_len: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_word_len: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
