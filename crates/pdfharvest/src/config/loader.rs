use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

/// Canonical config filename, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "pdfharvest.json";

/// Loads configuration from the given path. A missing file yields the
/// built-in defaults; a present-but-invalid file is an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.download_dir.is_empty() {
        return Err(ConfigError::Validation {
            message: "download_dir must not be empty".to_string(),
        });
    }

    if config.fetch.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "fetch.max_attempts must be at least 1".to_string(),
        });
    }

    if config.analyzer.top_k == 0 {
        return Err(ConfigError::Validation {
            message: "analyzer.top_k must be at least 1".to_string(),
        });
    }

    if config.analyzer.min_word_len == 0 {
        return Err(ConfigError::Validation {
            message: "analyzer.min_word_len must be at least 1".to_string(),
        });
    }

    Ok(())
}
