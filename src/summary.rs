//! Corpus summary file handling.
//!
//! `summary.json` lives at the corpus root and records the indexed shape of
//! the dataset plus the history of processing operations run against it.
//! Dataset operations (copy, extract, inverse) carry it to their destination
//! so derived corpora keep their provenance.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Name of the summary file stored at the corpus root.
pub const SUMMARY_FILE: &str = "summary.json";

/// Outcome of a single processing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Operation completed.
    Ok,
    /// Operation returned an error; the remaining queue was discarded.
    Fail,
}

/// One entry in the processing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Operation name.
    pub operation: String,
    /// Completion status.
    pub status: OperationStatus,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// When the operation finished.
    pub timestamp: DateTime<Utc>,
}

/// Persisted corpus statistics and processing history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Class identifiers at last index time.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Number of test cases at last index time.
    #[serde(default)]
    pub test_cases: usize,
    /// Per-class fraction of test cases, aligned with `classes`.
    #[serde(default)]
    pub stats: Vec<f64>,
    /// Processing operations run against this corpus, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Summary {
    /// Path of the summary file for a corpus root.
    pub fn file_path(root: &Path) -> PathBuf {
        root.join(SUMMARY_FILE)
    }

    /// Load the summary from a corpus root, or default when absent.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = Self::file_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the summary to a corpus root.
    pub fn save(&self, root: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(Self::file_path(root), text)?;
        Ok(())
    }

    /// Append a history entry.
    pub fn record(&mut self, operation: &str, status: OperationStatus, duration_ms: u64) {
        self.history.push(HistoryEntry {
            operation: operation.to_string(),
            status,
            duration_ms,
            timestamp: Utc::now(),
        });
    }
}
