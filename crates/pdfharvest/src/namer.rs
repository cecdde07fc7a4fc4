//! Sequential filename assignment for downloaded PDFs.
//!
//! Every call re-derives the next name from directory state rather than
//! an in-memory counter. This is the crash-safety invariant: a restart
//! mid-batch resumes after the highest existing ordinal and can never
//! hand out a name that collides with a file already on disk.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::PdfHarvestError;

pub struct SequentialNamer {
    directory: PathBuf,
    pattern: Regex,
}

impl SequentialNamer {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            // Anchored; non-matching files in the directory are ignored.
            pattern: Regex::new(r"^pdf(\d+)\.pdf$").expect("static pattern compiles"),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the next free sequential name, `pdf{NN}.pdf`.
    pub fn next_name(&self) -> Result<String, PdfHarvestError> {
        let max = self.highest_ordinal()?;
        Ok(format!("pdf{:02}.pdf", max + 1))
    }

    /// Highest ordinal currently present in the directory, 0 when none.
    /// Max rather than count: external cleanup may leave gaps, and a
    /// count-derived name could collide with a surviving file.
    fn highest_ordinal(&self) -> Result<u64, PdfHarvestError> {
        let entries = std::fs::read_dir(&self.directory).map_err(|e| PdfHarvestError::Io {
            path: self.directory.clone(),
            source: e,
        })?;

        let mut max = 0u64;
        for entry in entries {
            let entry = entry.map_err(|e| PdfHarvestError::Io {
                path: self.directory.clone(),
                source: e,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(caps) = self.pattern.captures(name) {
                if let Ok(n) = caps[1].parse::<u64>() {
                    max = max.max(n);
                }
            }
        }

        Ok(max)
    }
}
