//! Corpus indexing, enumeration, retrieval, and the operation queue.
//!
//! A corpus is a directory tree of weakness fixtures: every non-hidden
//! top-level directory is a class, and every directory below a class that
//! directly contains files is one test case. The index is rebuilt from disk;
//! fixtures themselves are read-only for the enumeration and retrieval API
//! and are only rewritten by explicit queued operations.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{CorpusError, Result};
use crate::fixture::{Fixture, FixturePath};
use crate::ops::Processing;
use crate::summary::{OperationStatus, Summary};

/// Outcome of draining the operation queue.
///
/// The queue holds `Box<dyn Processing>` values, so a malformed entry is
/// unrepresentable and no "invalid queue" outcome exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Every queued operation completed.
    Completed,
    /// The queue was empty.
    EmptyQueue,
    /// An operation failed; the remaining queue was discarded.
    OperationFailed,
}

/// A single integrity violation found by [`Corpus::verify`].
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// Fixture the violation was found in.
    pub path: String,
    /// Human-readable description.
    pub detail: String,
}

/// Report produced by [`Corpus::verify`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    /// Number of fixtures checked.
    pub fixtures: usize,
    /// Violations found, in enumeration order.
    pub violations: Vec<Violation>,
}

impl VerifyReport {
    /// Whether the corpus passed every check.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// An indexed fixture corpus rooted at a dataset directory.
pub struct Corpus {
    root: PathBuf,
    classes: Vec<String>,
    test_cases: BTreeSet<FixturePath>,
    stats: Vec<f64>,
    summary: Summary,
    queue: Vec<Box<dyn Processing>>,
}

impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus")
            .field("root", &self.root)
            .field("classes", &self.classes)
            .field("test_cases", &self.test_cases)
            .field("stats", &self.stats)
            .field("summary", &self.summary)
            .field("queue", &self.queue.iter().map(|op| op.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Corpus {
    /// Open and index the corpus at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        validate_root(&root)?;

        let summary = Summary::load_or_default(&root)?;
        let mut corpus = Self {
            root,
            classes: Vec::new(),
            test_cases: BTreeSet::new(),
            stats: Vec::new(),
            summary,
            queue: Vec::new(),
        };
        corpus.rebuild_index()?;
        Ok(corpus)
    }

    /// Re-index the corpus from disk.
    ///
    /// Called on open and by operations that add or remove files.
    pub fn rebuild_index(&mut self) -> Result<()> {
        debug!("rebuilding corpus index at {:?}", self.root);
        let start = Instant::now();

        self.classes.clear();
        self.test_cases.clear();
        self.stats.clear();

        let mut entries: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();

        let mut class_counts: Vec<usize> = Vec::new();
        for entry in entries {
            if !entry.is_dir() || is_hidden(&entry) {
                continue;
            }
            let class = entry
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            let before = self.test_cases.len();
            for file in WalkDir::new(&entry)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if file.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                let parent = file.path().parent().unwrap_or(&entry);
                if let Ok(rel) = parent.strip_prefix(&self.root) {
                    self.test_cases
                        .insert(FixturePath::new(rel.to_string_lossy()));
                }
            }

            class_counts.push(self.test_cases.len() - before);
            self.classes.push(class);
        }

        let total = self.test_cases.len();
        if total > 0 {
            self.stats = class_counts
                .iter()
                .map(|&c| c as f64 / total as f64)
                .collect();
        }

        self.summary.classes = self.classes.clone();
        self.summary.test_cases = total;
        self.summary.stats = self.stats.clone();

        info!(
            "corpus index built in {}ms: {} test cases, {} classes",
            start.elapsed().as_millis(),
            total,
            self.classes.len()
        );
        Ok(())
    }

    /// Corpus root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class identifiers, in directory order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Per-class fraction of test cases, aligned with [`Corpus::classes`].
    pub fn stats(&self) -> &[f64] {
        &self.stats
    }

    /// Enumerate test case identifiers, sorted and unique.
    pub fn test_cases(&self) -> impl Iterator<Item = &FixturePath> {
        self.test_cases.iter()
    }

    /// Test cases belonging to a class.
    pub fn test_cases_for_class<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = &'a FixturePath> + 'a {
        self.test_cases.iter().filter(move |tc| tc.class() == class)
    }

    /// Number of test cases.
    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    /// Whether the corpus holds no test cases.
    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }

    /// Whether a test case is indexed.
    pub fn contains(&self, path: &FixturePath) -> bool {
        self.test_cases.contains(path)
    }

    /// The summary loaded from (and saved back to) the corpus root.
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Retrieve a fixture by identifier.
    pub fn fixture(&self, path: impl Into<FixturePath>) -> Result<Fixture> {
        let path = path.into();
        if !self.test_cases.contains(&path) {
            return Err(CorpusError::FixtureNotFound(path.as_str().to_string()));
        }
        Fixture::load(&self.root, path)
    }

    /// Retrieve a single source file's text by `class/test-case/file`
    /// identifier, byte-for-byte.
    pub fn source_text(&self, ident: &str) -> Result<String> {
        let ident = ident.trim_matches('/');
        let (dir, file) = ident
            .rsplit_once('/')
            .ok_or_else(|| CorpusError::FixtureNotFound(ident.to_string()))?;
        let path = FixturePath::new(dir);
        if !self.test_cases.contains(&path) {
            return Err(CorpusError::FixtureNotFound(ident.to_string()));
        }

        let full = path.resolve(&self.root).join(file);
        if !full.is_file() {
            return Err(CorpusError::FixtureNotFound(ident.to_string()));
        }
        Ok(fs::read_to_string(full)?)
    }

    /// Check the corpus against its integrity properties.
    ///
    /// Per fixture: it holds at least one file, exactly one entry point
    /// definition is present, and both retrieval paths return identical
    /// bytes (compared via SHA-256).
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();

        for path in &self.test_cases {
            report.fixtures += 1;
            let fixture = Fixture::load(&self.root, path.clone())?;

            if fixture.files.is_empty() {
                report.violations.push(Violation {
                    path: path.as_str().to_string(),
                    detail: "fixture holds no files".to_string(),
                });
                continue;
            }

            let meta = fixture.metadata();
            if meta.entry_point_count != 1 {
                report.violations.push(Violation {
                    path: path.as_str().to_string(),
                    detail: format!(
                        "expected exactly one entry point, found {}",
                        meta.entry_point_count
                    ),
                });
            }

            for file in &fixture.files {
                let ident = format!("{}/{}", path, file.name);
                let retrieved = self.source_text(&ident)?;
                if crate::fixture::checksum_of(&retrieved) != file.checksum() {
                    report.violations.push(Violation {
                        path: path.as_str().to_string(),
                        detail: format!("source text of '{}' does not round-trip", file.name),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Queue a processing operation.
    pub fn queue_operation(&mut self, op: Box<dyn Processing>) {
        self.queue.push(op);
    }

    /// Number of queued operations.
    pub fn queued_operations(&self) -> usize {
        self.queue.len()
    }

    /// Drain the operation queue in order.
    ///
    /// A failing operation discards the rest of the queue. Every run is
    /// recorded in the summary history, which is saved to the corpus root.
    pub fn process(&mut self) -> QueueOutcome {
        let start = Instant::now();
        debug!("processing operation queue");

        let total = self.queue.len();
        if total == 0 {
            info!("no operation in queue");
            return QueueOutcome::EmptyQueue;
        }

        let mut current = 0;
        while !self.queue.is_empty() {
            let op = self.queue.remove(0);
            current += 1;
            info!("running operation {}/{} ({})", current, total, op.name());

            let op_start = Instant::now();
            match op.execute(self) {
                Ok(()) => {
                    self.summary.record(
                        op.name(),
                        OperationStatus::Ok,
                        op_start.elapsed().as_millis() as u64,
                    );
                }
                Err(e) => {
                    error!("operation {}/{} failed: {}", current, total, e);
                    self.summary.record(
                        op.name(),
                        OperationStatus::Fail,
                        op_start.elapsed().as_millis() as u64,
                    );
                    self.queue.clear();
                    self.save_summary();
                    return QueueOutcome::OperationFailed;
                }
            }
        }

        self.save_summary();
        info!(
            "{} operations run in {}ms",
            current,
            start.elapsed().as_millis()
        );
        QueueOutcome::Completed
    }

    fn save_summary(&self) {
        if let Err(e) = self.summary.save(&self.root) {
            warn!("could not save summary to {:?}: {}", self.root, e);
        }
    }
}

/// Validate a corpus root directory.
pub fn validate_root(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CorpusError::RootNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(CorpusError::NotADirectory(path.to_path_buf()));
    }
    // Check if readable
    fs::read_dir(path)?;
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_fixture(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_open_missing_root() {
        let err = Corpus::open("/nonexistent/corpus").unwrap_err();
        assert!(matches!(err, CorpusError::RootNotFound(_)));
    }

    #[test]
    fn test_open_file_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();
        let err = Corpus::open(&file).unwrap_err();
        assert!(matches!(err, CorpusError::NotADirectory(_)));
    }

    #[test]
    fn test_index_classes_and_test_cases() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "class01/tc01/item.c", "void test_function()\n{\n}\n");
        write_fixture(dir.path(), "class01/tc02/item.c", "void test_function()\n{\n}\n");
        write_fixture(dir.path(), "class02/tc01/item.c", "void test_function()\n{\n}\n");

        let corpus = Corpus::open(dir.path()).unwrap();
        assert_eq!(corpus.classes(), &["class01", "class02"]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.stats().len(), 2);
        assert!((corpus.stats()[0] - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hidden_entries_are_skipped() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "class01/tc01/item.c", "void test_function()\n{\n}\n");
        write_fixture(dir.path(), ".hidden/tc01/item.c", "x");
        write_fixture(dir.path(), "class01/tc01/.DS_Store", "x");

        let corpus = Corpus::open(dir.path()).unwrap();
        assert_eq!(corpus.classes(), &["class01"]);
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_fixture_not_found() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "class01/tc01/item.c", "void test_function()\n{\n}\n");

        let corpus = Corpus::open(dir.path()).unwrap();
        let err = corpus.fixture("class01/tc99").unwrap_err();
        assert!(matches!(err, CorpusError::FixtureNotFound(_)));
    }

    #[test]
    fn test_source_text_round_trip() {
        let dir = tempdir().unwrap();
        let text = "void test_function()\n{\n    /* FLAW: nothing */\n}\n";
        write_fixture(dir.path(), "class01/tc01/item.c", text);

        let corpus = Corpus::open(dir.path()).unwrap();
        assert_eq!(corpus.source_text("class01/tc01/item.c").unwrap(), text);
    }

    #[test]
    fn test_empty_queue_outcome() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "class01/tc01/item.c", "void test_function()\n{\n}\n");

        let mut corpus = Corpus::open(dir.path()).unwrap();
        assert_eq!(corpus.process(), QueueOutcome::EmptyQueue);
    }

    #[test]
    fn test_verify_clean_corpus() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "class01/tc01/item.c", "void test_function()\n{\n}\n");

        let corpus = Corpus::open(dir.path()).unwrap();
        let report = corpus.verify().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.fixtures, 1);
    }

    #[test]
    fn test_verify_flags_missing_entry_point() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "class01/tc01/item.c", "int main() { return 0; }\n");

        let corpus = Corpus::open(dir.path()).unwrap();
        let report = corpus.verify().unwrap();
        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].detail.contains("entry point"));
    }
}
