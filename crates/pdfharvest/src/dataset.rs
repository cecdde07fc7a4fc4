//! Dataset loading.
//!
//! `Dataset.json` is a flat JSON object mapping a logical id (`"pdf7"`)
//! to the URL the PDF lives at. Read-only input; no lifecycle beyond load.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

/// One entry of the input dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetEntry {
    pub logical_id: String,
    pub url: String,
}

/// Loads the dataset and returns entries ordered by the numeric suffix
/// of the logical id (`pdf2` before `pdf10`). Ids without a numeric
/// suffix sort after numbered ones, lexicographically.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<DatasetEntry>, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse(&content)
}

pub fn parse(content: &str) -> Result<Vec<DatasetEntry>, ConfigError> {
    let map: BTreeMap<String, String> = serde_json::from_str(content)?;

    let mut entries: Vec<DatasetEntry> = map
        .into_iter()
        .map(|(logical_id, url)| DatasetEntry { logical_id, url })
        .collect();

    entries.sort_by(|a, b| match (ordinal(&a.logical_id), ordinal(&b.logical_id)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.logical_id.cmp(&b.logical_id),
    });

    Ok(entries)
}

/// Numeric suffix of a logical id, e.g. `pdf12` -> 12.
fn ordinal(id: &str) -> Option<u64> {
    let digits: String = id.chars().skip_while(|c| !c.is_ascii_digit()).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
