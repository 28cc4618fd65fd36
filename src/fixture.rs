//! Fixture model and metadata extraction.
//!
//! A fixture is one test case of the corpus: a directory holding one or more
//! standalone C translation units that expose a single uniform entry point
//! and call nothing beyond a small closed set of helper primitives.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Uniform entry symbol every fixture exposes.
pub const ENTRY_POINT: &str = "test_function";

/// Shared declaration header fixtures may include.
pub const TESTCASE_HEADER: &str = "std_testcase.h";

/// Output helper primitive fixtures may call.
pub const PRINT_HELPER: &str = "printLine";

/// Scoped stack-allocation primitive fixtures may call.
pub const ALLOCA_HELPER: &str = "ALLOCA";

/// File extensions considered part of a fixture.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "h", "hpp"];

/// Matches a definition (or prototype) of the uniform entry point.
static ENTRY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*void\s+test_function\s*\(\s*(?:void)?\s*\)").unwrap()
});

/// Matches object-like `#define NAME VALUE` lines. Function-like macros do
/// not match because the opening parenthesis follows the name directly.
static DEFINE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#define[ \t]+([A-Za-z_]\w*)[ \t]+(.+)$").unwrap()
});

/// Matches inclusion of the shared test case header.
static HEADER_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#include\s+"std_testcase\.h""#).unwrap());

/// Hierarchical fixture identifier, relative to the corpus root.
///
/// Stored with `/` separators and no leading or trailing slash, e.g.
/// `class01/tc02`. The first segment is the class, the last the test case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixturePath(String);

impl FixturePath {
    /// Normalize a relative path into a fixture identifier.
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path
            .as_ref()
            .replace('\\', "/")
            .trim_matches('/')
            .to_string();
        Self(normalized)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Class identifier (first path segment).
    pub fn class(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    /// Test case identifier (last path segment).
    pub fn test_case(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Resolve the identifier against a corpus root.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.0.split('/') {
            out.push(segment);
        }
        out
    }
}

impl fmt::Display for FixturePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FixturePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A compile-time constant declared by a fixture via `#define`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredConstant {
    /// Macro name.
    pub name: String,
    /// Literal replacement text, trimmed.
    pub value: String,
}

/// A single source file belonging to a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name within the test case directory.
    pub name: String,
    /// Literal file content, byte-for-byte.
    pub text: String,
}

impl SourceFile {
    /// Whether this file is a header.
    pub fn is_header(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "h" || e == "hpp")
    }

    /// SHA-256 checksum of the content, hex-encoded.
    pub fn checksum(&self) -> String {
        checksum_of(&self.text)
    }
}

/// SHA-256 checksum of a source text, hex-encoded.
pub fn checksum_of(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Metadata extracted from a fixture's source text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureMetadata {
    /// Entry point name, present when exactly one definition was found.
    pub entry_point: Option<String>,
    /// Number of entry point definitions across non-header files.
    pub entry_point_count: usize,
    /// Object-like `#define` constants, in declaration order.
    pub declared_constants: Vec<DeclaredConstant>,
    /// Whether any file calls the output helper.
    pub uses_print_helper: bool,
    /// Whether any file calls the stack-allocation helper.
    pub uses_alloca: bool,
    /// Whether any file includes the shared test case header.
    pub includes_testcase_header: bool,
}

/// A fixture: identifier plus the source files it comprises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// Identifier relative to the corpus root.
    pub path: FixturePath,
    /// Source files, sorted by name.
    pub files: Vec<SourceFile>,
}

impl Fixture {
    /// Load a fixture's files from disk.
    ///
    /// Hidden files and subdirectories are skipped; remaining files are read
    /// verbatim and sorted by name.
    pub fn load(root: &Path, path: FixturePath) -> Result<Self> {
        let dir = path.resolve(root);
        let mut files = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let text = fs::read_to_string(entry.path())?;
            files.push(SourceFile { name, text });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { path, files })
    }

    /// Look up a file by name.
    pub fn file(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Retrieve a file's source text by name.
    pub fn source_text(&self, name: &str) -> Option<&str> {
        self.file(name).map(|f| f.text.as_str())
    }

    /// Extract metadata from the fixture's source text.
    pub fn metadata(&self) -> FixtureMetadata {
        let mut meta = FixtureMetadata::default();

        for file in &self.files {
            if !file.is_header() {
                meta.entry_point_count += ENTRY_DEF.find_iter(&file.text).count();
            }
            for caps in DEFINE_LINE.captures_iter(&file.text) {
                meta.declared_constants.push(DeclaredConstant {
                    name: caps[1].to_string(),
                    value: caps[2].trim_end().to_string(),
                });
            }
            meta.uses_print_helper |= file.text.contains(PRINT_HELPER);
            meta.uses_alloca |= file.text.contains(ALLOCA_HELPER);
            meta.includes_testcase_header |= HEADER_INCLUDE.is_match(&file.text);
        }

        if meta.entry_point_count == 1 {
            meta.entry_point = Some(ENTRY_POINT.to_string());
        }
        meta
    }
}

/// Whether a file name carries one of the recognized source extensions.
pub fn is_source_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STACK_OVERFLOW_FIXTURE: &str =
        include_str!("../test-fixtures/dataset01/class01/tc02/item.c");
    const UNINIT_POINTER_FIXTURE: &str =
        include_str!("../test-fixtures/dataset01/class02/tc03/item.c");

    fn fixture_from(text: &str) -> Fixture {
        Fixture {
            path: FixturePath::new("class01/tc02"),
            files: vec![SourceFile {
                name: "item.c".to_string(),
                text: text.to_string(),
            }],
        }
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(FixturePath::new("/class01/tc02/").as_str(), "class01/tc02");
        assert_eq!(FixturePath::new("class01\\tc02").as_str(), "class01/tc02");
    }

    #[test]
    fn test_path_segments() {
        let path = FixturePath::new("class01/tc02");
        assert_eq!(path.class(), "class01");
        assert_eq!(path.test_case(), "tc02");
    }

    #[test]
    fn test_entry_point_detected_once() {
        let meta = fixture_from(STACK_OVERFLOW_FIXTURE).metadata();
        assert_eq!(meta.entry_point_count, 1);
        assert_eq!(meta.entry_point.as_deref(), Some("test_function"));
    }

    #[test]
    fn test_declared_constants_extracted() {
        let meta = fixture_from(STACK_OVERFLOW_FIXTURE).metadata();
        assert_eq!(meta.declared_constants.len(), 1);
        assert_eq!(meta.declared_constants[0].name, "SRC_STRING");
        assert_eq!(meta.declared_constants[0].value, "L\"AAAAAAAAAA\"");
    }

    #[test]
    fn test_helper_usage_detected() {
        let meta = fixture_from(STACK_OVERFLOW_FIXTURE).metadata();
        assert!(meta.uses_alloca);
        assert!(!meta.uses_print_helper);
        assert!(meta.includes_testcase_header);

        let meta = fixture_from(UNINIT_POINTER_FIXTURE).metadata();
        assert!(meta.uses_print_helper);
        assert!(!meta.uses_alloca);
    }

    #[test]
    fn test_function_like_macros_are_not_constants() {
        let meta = fixture_from("#define WRAP(x) ((x) + 1)\n#define LEN 10\n").metadata();
        assert_eq!(meta.declared_constants.len(), 1);
        assert_eq!(meta.declared_constants[0].name, "LEN");
        assert_eq!(meta.declared_constants[0].value, "10");
    }

    #[test]
    fn test_missing_entry_point() {
        let meta = fixture_from("int helper() { return 0; }\n").metadata();
        assert_eq!(meta.entry_point_count, 0);
        assert!(meta.entry_point.is_none());
    }

    #[test]
    fn test_headers_do_not_count_entry_points() {
        let fixture = Fixture {
            path: FixturePath::new("class01/tc01"),
            files: vec![
                SourceFile {
                    name: "item.c".to_string(),
                    text: "void test_function()\n{\n}\n".to_string(),
                },
                SourceFile {
                    name: "item.h".to_string(),
                    text: "void test_function();\n".to_string(),
                },
            ],
        };
        assert_eq!(fixture.metadata().entry_point_count, 1);
    }

    #[test]
    fn test_checksum_is_stable() {
        let file = SourceFile {
            name: "item.c".to_string(),
            text: "void test_function()\n{\n}\n".to_string(),
        };
        assert_eq!(file.checksum(), file.checksum());
        assert_eq!(file.checksum().len(), 64);
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("item.c"));
        assert!(is_source_file("item.cpp"));
        assert!(is_source_file("item.h"));
        assert!(!is_source_file("notes.txt"));
        assert!(!is_source_file("Makefile"));
    }
}
