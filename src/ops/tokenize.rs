//! Tokenizer operations that reduce identifier uniqueness across the corpus.
//!
//! User-defined function names become `FUN1..FUNn` and user-defined variable
//! names become `VAR1..VARn`, numbered per file in order of first sight.
//! String literals are dropped, hex literals collapse to `HEX`, and
//! non-ASCII bytes are removed, so tokenized output is a normalized corpus
//! for embedding tools, not compilable C.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::{apply_transform, rewrite_file, split_line_ending, FileTransform, Processing};
use crate::corpus::Corpus;
use crate::error::Result;

static IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_A-Za-z]\w*").unwrap());
static STRING_LIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"".*?""#).unwrap());
static HEX_LIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0[xX][0-9a-fA-F]+").unwrap());

/// Identifiers the tokenizers never replace: C keywords, fixed fixture
/// types, the uniform entry point and helper primitives, harness symbols,
/// and the libc sinks the fixtures exercise.
static RESERVED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "auto", "break", "case", "char", "const", "continue", "default", "do",
        "double", "else", "enum", "extern", "float", "for", "goto", "if",
        "inline", "int", "long", "register", "return", "short", "signed",
        "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned",
        "void", "volatile", "while",
        // fixture types and markers
        "size_t", "wchar_t", "NULL", "HEX", "L",
        // entry point and helper primitives
        "test_function", "printLine", "printWLine", "printIntLine", "ALLOCA",
        // harness symbols
        "main", "argc", "argv",
        // libc sinks
        "memset", "memcpy", "memmove", "strcpy", "strncpy", "strlen", "strcat",
        "wcscpy", "wcsncpy", "wcslen", "wcscat", "malloc", "calloc", "realloc",
        "free", "printf", "fprintf", "fgets", "alloca",
    ]
    .into_iter()
    .collect()
});

/// Syntactic role of an identifier occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Followed by an opening parenthesis: a call or definition.
    Call,
    /// Followed by further identifiers (possibly through `*`): a type or
    /// qualifier position.
    Declarator,
    /// Anything else: a value use.
    Value,
}

fn classify(line: &str, end: usize) -> Role {
    let rest = line[end..].trim_start_matches([' ', '\t']);
    if rest.starts_with('(') {
        return Role::Call;
    }
    let rest = rest.trim_start_matches(['*', ' ', '\t']);
    if rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Role::Declarator;
    }
    Role::Value
}

/// Drop string literals, collapse hex literals, strip non-ASCII bytes.
fn normalize_line(line: &str) -> String {
    let no_strings = STRING_LIT.replace_all(line, "");
    let no_hex = HEX_LIT.replace_all(&no_strings, "HEX");
    no_hex.chars().filter(char::is_ascii).collect()
}

/// Tokenize one file, replacing identifiers of `wanted` role with
/// `prefix<n>` tokens. Returns the number of distinct symbols replaced.
fn tokenize_file(path: &Path, prefix: &str, wanted: Role) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    let mut symbols: HashMap<String, String> = HashMap::new();
    let mut out = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        let norm = normalize_line(body);

        let mut rebuilt = String::with_capacity(norm.len());
        let mut last = 0;
        for m in IDENT.find_iter(&norm) {
            rebuilt.push_str(&norm[last..m.start()]);
            let name = m.as_str();

            if classify(&norm, m.end()) == wanted && !RESERVED.contains(name) {
                if !symbols.contains_key(name) {
                    let token = format!("{}{}", prefix, symbols.len() + 1);
                    symbols.insert(name.to_string(), token);
                }
                rebuilt.push_str(&symbols[name]);
            } else {
                rebuilt.push_str(name);
            }
            last = m.end();
        }
        rebuilt.push_str(&norm[last..]);

        out.push_str(&rebuilt);
        out.push_str(ending);
    }

    debug!("{} symbols replaced in {:?}", symbols.len(), path);
    rewrite_file(path, &out)?;
    Ok(symbols.len())
}

fn is_tokenizable(name: &str) -> bool {
    name.ends_with(".c") || name.ends_with(".h")
}

/// Replace user-defined function names with `FUN<n>` tokens.
pub struct ReplaceFunctions;

impl FileTransform for ReplaceFunctions {
    fn match_file(&self, name: &str) -> bool {
        is_tokenizable(name)
    }

    fn process_file(&self, path: &Path) -> Result<usize> {
        tokenize_file(path, "FUN", Role::Call)
    }
}

impl Processing for ReplaceFunctions {
    fn name(&self) -> &'static str {
        "replace_functions"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!("replacing functions in corpus at {:?}", corpus.root());
        let replaced = apply_transform(corpus, self)?;
        corpus.rebuild_index()?;
        info!("{} function symbols replaced", replaced);
        Ok(())
    }
}

/// Replace user-defined variable names with `VAR<n>` tokens.
pub struct ReplaceVariables;

impl FileTransform for ReplaceVariables {
    fn match_file(&self, name: &str) -> bool {
        is_tokenizable(name)
    }

    fn process_file(&self, path: &Path) -> Result<usize> {
        tokenize_file(path, "VAR", Role::Value)
    }
}

impl Processing for ReplaceVariables {
    fn name(&self) -> &'static str {
        "replace_variables"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!("replacing variables in corpus at {:?}", corpus.root());
        let replaced = apply_transform(corpus, self)?;
        corpus.rebuild_index()?;
        info!("{} variable symbols replaced", replaced);
        Ok(())
    }
}
