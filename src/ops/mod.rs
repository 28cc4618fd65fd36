//! Queueable processing operations over a corpus.
//!
//! Operations implement [`Processing`] and run through the corpus operation
//! queue. File-level transforms share the helpers here: they enumerate files
//! test case by test case, rewrite or remove them, and the owning operation
//! reindexes the corpus afterwards.

pub mod cleaning;
pub mod copy;
pub mod extract;
pub mod inverse;
pub mod tokenize;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::corpus::Corpus;
use crate::error::{CorpusError, Result};
use crate::fixture::FixturePath;
use crate::summary::SUMMARY_FILE;

pub use cleaning::{
    RemoveComments, RemoveCppFiles, RemoveInterprocFiles, RemoveMainFunction, ReplaceWideLiterals,
};
pub use copy::CopyCorpus;
pub use extract::ExtractSample;
pub use inverse::InverseCorpus;
pub use tokenize::{ReplaceFunctions, ReplaceVariables};

/// A processing operation that can be queued against a corpus.
pub trait Processing {
    /// Stable operation name, used for logging and the summary history.
    fn name(&self) -> &'static str;

    /// Run the operation.
    fn execute(&self, corpus: &mut Corpus) -> Result<()>;
}

/// A per-file transform applied across every test case.
pub trait FileTransform: Sync {
    /// Whether a file (by name) should be processed.
    fn match_file(&self, name: &str) -> bool;

    /// Transform one file in place. Returns the number of changes made.
    fn process_file(&self, path: &Path) -> Result<usize>;
}

/// Apply a transform to every matching file of every test case.
///
/// Fixtures are independent, so files are processed in parallel. Returns the
/// total change count.
pub fn apply_transform(corpus: &Corpus, transform: &dyn FileTransform) -> Result<usize> {
    let files = matching_files(corpus, &|name| transform.match_file(name))?;
    debug!("applying transform to {} files", files.len());

    let counts: Vec<Result<usize>> = files
        .par_iter()
        .map(|path| transform.process_file(path))
        .collect();

    let mut total = 0;
    for count in counts {
        total += count?;
    }
    Ok(total)
}

/// Remove every matching file; test case directories left without files are
/// deleted so the subsequent reindex drops them.
pub fn remove_matching_files(
    corpus: &Corpus,
    matcher: impl Fn(&str) -> bool,
) -> Result<usize> {
    let mut removed = 0;

    for path in matching_files(corpus, &matcher)? {
        debug!("removing file {:?}", path);
        fs::remove_file(&path)?;
        removed += 1;

        let Some(dir) = path.parent() else { continue };
        if fs::read_dir(dir)?.next().is_none() {
            debug!("removing empty test case directory {:?}", dir);
            fs::remove_dir_all(dir)?;
        }
    }

    Ok(removed)
}

/// Collect the full paths of matching, non-hidden files across all test cases.
fn matching_files(corpus: &Corpus, matcher: &dyn Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for test_case in corpus.test_cases() {
        let dir = test_case.resolve(corpus.root());
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !matcher(&name) {
                continue;
            }
            files.push(entry.path());
        }
    }

    Ok(files)
}

/// Split a line produced by `split_inclusive('\n')` into body and ending.
pub(crate) fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Rewrite a file through a temporary sibling, then rename over the original.
pub(crate) fn rewrite_file(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Refuse an existing destination unless `force`, in which case remove it.
pub(crate) fn prepare_destination(to: &Path, force: bool) -> Result<()> {
    if to.exists() {
        if !force {
            return Err(CorpusError::DestinationExists(to.to_path_buf()));
        }
        fs::remove_dir_all(to)?;
    }
    Ok(())
}

/// Recursively copy a directory tree.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from).into_iter().filter_map(|e| e.ok()) {
        let rel = entry
            .path()
            .strip_prefix(from)
            .unwrap_or_else(|_| Path::new(""));
        let dest = to.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Copy a single test case directory into a destination corpus root.
pub(crate) fn copy_test_case(root: &Path, to: &Path, test_case: &FixturePath) -> Result<()> {
    copy_tree(&test_case.resolve(root), &test_case.resolve(to))
}

/// Carry the summary file to a destination corpus root, when present.
pub(crate) fn copy_summary(root: &Path, to: &Path) -> Result<()> {
    let src = root.join(SUMMARY_FILE);
    if src.is_file() {
        fs::create_dir_all(to)?;
        fs::copy(src, to.join(SUMMARY_FILE))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_rewrite_file_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("item.c");
        fs::write(&path, "old").unwrap();

        rewrite_file(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join("item.c.tmp").exists());
    }

    #[test]
    fn test_prepare_destination_refuses_without_force() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let err = prepare_destination(&dest, false).unwrap_err();
        assert!(matches!(err, CorpusError::DestinationExists(_)));

        prepare_destination(&dest, true).unwrap();
        assert!(!dest.exists());
    }

    #[test]
    fn test_copy_tree_preserves_structure() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/item.c"), "void test_function()\n{\n}\n").unwrap();

        let dest = dir.path().join("dest");
        copy_tree(&src, &dest).unwrap();
        assert_eq!(
            fs::read_to_string(dest.join("a/b/item.c")).unwrap(),
            "void test_function()\n{\n}\n"
        );
    }
}
