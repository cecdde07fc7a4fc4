use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfHarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Database error: {0}")]
    Database(#[from] crate::store::DatabaseError),

    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Web server error: {0}")]
    Web(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Failures while fetching a PDF over HTTP.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("Server returned HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Response is not a PDF: {0}")]
    InvalidContent(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// Failures while extracting text from PDF bytes.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF structure could not be parsed: {0}")]
    Corrupt(String),

    #[error("PDF is password-protected")]
    Encrypted,

    #[error("PDF contains no extractable text")]
    Empty,
}

impl FetchError {
    /// Short stable identifier used when recording to the error log.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::Tls(_) => "ssl",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::InvalidContent(_) => "invalid_content",
            FetchError::Request(_) => "request",
        }
    }
}

impl ExtractError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::Corrupt(_) => "corrupt",
            ExtractError::Encrypted => "encrypted",
            ExtractError::Empty => "empty",
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfHarvestError>;
