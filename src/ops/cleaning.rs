//! Cleaning operations that normalize a corpus in place.
//!
//! These remove files the downstream tooling cannot parse and rewrite
//! constructs it mishandles. Every operation reindexes the corpus once its
//! file changes are done.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::{
    apply_transform, remove_matching_files, rewrite_file, split_line_ending, FileTransform,
    Processing,
};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::fixture::is_source_file;

/// Interprocedural test case files: a numbered series suffixed `a` through
/// `e`, e.g. `CWE121_01a.c`. Headers never match.
static INTERPROC_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+[a-e]\.c$").unwrap());

/// Wide-char literal rewrites, one anchored pattern per literal kind.
static WIDE_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*)L'([^']*)'(.*)").unwrap());
static WIDE_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(.*)L"([^"]*)"(.*)"#).unwrap());

/// Comments, with string and char literals captured first so they survive.
static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?ms)(".*?"|'.*?')|(/\*.*?\*/|//[^\r\n]*$)"#).unwrap()
});

/// First line of the compile-harness main function block.
const MAIN_FN_ENTRY: &str = "#ifdef INCLUDEMAIN";
/// Last line of the compile-harness main function block.
const MAIN_FN_EXIT: &str = "#endif";

/// Remove C++ translation units from the corpus.
pub struct RemoveCppFiles;

impl Processing for RemoveCppFiles {
    fn name(&self) -> &'static str {
        "remove_cpp_files"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!("removing C++ files from corpus at {:?}", corpus.root());
        let removed = remove_matching_files(corpus, |name| name.ends_with(".cpp"))?;
        corpus.rebuild_index()?;
        info!("{} C++ files removed", removed);
        Ok(())
    }
}

/// Remove interprocedural test case files from the corpus.
pub struct RemoveInterprocFiles;

impl Processing for RemoveInterprocFiles {
    fn name(&self) -> &'static str {
        "remove_interproc_files"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!(
            "removing interprocedural test cases from corpus at {:?}",
            corpus.root()
        );
        let removed = remove_matching_files(corpus, |name| {
            !name.ends_with(".h") && INTERPROC_FILE.is_match(name)
        })?;
        corpus.rebuild_index()?;
        info!("{} interprocedural files removed", removed);
        Ok(())
    }
}

/// Rewrite wide-char literals (`L'x'`, `L"s"`) into their call-form
/// equivalents (`L('x')`, `L("s")`).
pub struct ReplaceWideLiterals;

impl ReplaceWideLiterals {
    /// Rewrite one line; at most one literal per pattern is rewritten, so
    /// callers loop until no replacements remain.
    fn rewrite_line(line: &str) -> (String, usize) {
        let mut line = line.to_string();
        let mut count = 0;

        if WIDE_CHAR.is_match(&line) {
            line = WIDE_CHAR.replace(&line, "${1}L('${2}')${3}").to_string();
            count += 1;
        }
        if WIDE_STRING.is_match(&line) {
            line = WIDE_STRING
                .replace(&line, "${1}L(\"${2}\")${3}")
                .to_string();
            count += 1;
        }

        (line, count)
    }
}

impl FileTransform for ReplaceWideLiterals {
    fn match_file(&self, name: &str) -> bool {
        is_source_file(name)
    }

    fn process_file(&self, path: &Path) -> Result<usize> {
        let text = fs::read_to_string(path)?;
        let mut out = String::with_capacity(text.len());
        let mut count = 0;

        for line in text.split_inclusive('\n') {
            let (body, ending) = split_line_ending(line);
            let (rewritten, n) = Self::rewrite_line(body);
            count += n;
            out.push_str(&rewritten);
            out.push_str(ending);
        }

        if count > 0 {
            rewrite_file(path, &out)?;
        }
        Ok(count)
    }
}

impl Processing for ReplaceWideLiterals {
    fn name(&self) -> &'static str {
        "replace_wide_literals"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!("replacing wide-char literals in corpus at {:?}", corpus.root());

        // One pass rewrites one literal per line per pattern; iterate to a
        // fixed point.
        let mut total = 0;
        loop {
            let replaced = apply_transform(corpus, self)?;
            total += replaced;
            if replaced == 0 {
                break;
            }
        }

        corpus.rebuild_index()?;
        info!("{} wide-char literals replaced", total);
        Ok(())
    }
}

/// Remove the `#ifdef INCLUDEMAIN` main function block from every file.
pub struct RemoveMainFunction;

impl FileTransform for RemoveMainFunction {
    fn match_file(&self, name: &str) -> bool {
        is_source_file(name)
    }

    fn process_file(&self, path: &Path) -> Result<usize> {
        let text = fs::read_to_string(path)?;
        let mut out = String::with_capacity(text.len());
        let mut in_main_fn = false;
        let mut removed = 0;

        for line in text.split_inclusive('\n') {
            let (body, _) = split_line_ending(line);
            if !in_main_fn {
                if body == MAIN_FN_ENTRY {
                    in_main_fn = true;
                    removed += 1;
                } else {
                    out.push_str(line);
                }
            } else {
                removed += 1;
                if body == MAIN_FN_EXIT {
                    in_main_fn = false;
                }
            }
        }

        if removed > 0 {
            rewrite_file(path, &out)?;
        }
        Ok(removed)
    }
}

impl Processing for RemoveMainFunction {
    fn name(&self) -> &'static str {
        "remove_main_function"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!("removing main functions in corpus at {:?}", corpus.root());
        let removed = apply_transform(corpus, self)?;
        corpus.rebuild_index()?;
        info!("{} main function lines removed", removed);
        Ok(())
    }
}

/// Strip comments while preserving string and char literals, then drop blank
/// lines and re-emit each remaining line trimmed.
pub struct RemoveComments;

impl RemoveComments {
    fn strip(text: &str) -> (String, usize) {
        let mut count = 0;
        let stripped = COMMENT.replace_all(text, |caps: &regex::Captures<'_>| {
            if caps.get(2).is_some() {
                count += 1;
                String::new()
            } else {
                caps[1].to_string()
            }
        });

        let mut out = String::with_capacity(stripped.len());
        for line in stripped.lines() {
            let line = line.trim();
            if !line.is_empty() {
                out.push_str(line);
                out.push('\n');
            }
        }
        (out, count)
    }
}

impl FileTransform for RemoveComments {
    fn match_file(&self, name: &str) -> bool {
        is_source_file(name)
    }

    fn process_file(&self, path: &Path) -> Result<usize> {
        let text = fs::read_to_string(path)?;
        let (out, count) = Self::strip(&text);
        rewrite_file(path, &out)?;
        Ok(count)
    }
}

impl Processing for RemoveComments {
    fn name(&self) -> &'static str {
        "remove_comments"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!("removing comments in corpus at {:?}", corpus.root());
        let removed = apply_transform(corpus, self)?;
        corpus.rebuild_index()?;
        info!("{} comments removed", removed);
        Ok(())
    }
}
