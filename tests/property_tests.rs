//! Property-based tests using proptest.
//!
//! These verify the corpus data-integrity invariants for generated inputs,
//! not just the shipped fixtures.

use std::fs;

use proptest::prelude::*;
use tempfile::tempdir;

use cwe_corpus::corpus::Corpus;
use cwe_corpus::fixture::{Fixture, FixturePath, SourceFile};

// Strategy generators for test data

/// Generate valid class directory names
fn class_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("class[0-9]{2}").unwrap()
}

/// Generate valid test case directory names
fn test_case_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("tc[0-9]{2}[a-z]?").unwrap()
}

/// Generate fixture body text: printable ASCII lines
fn fixture_body() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[ -~]{0,60}").unwrap(),
        0..20,
    )
    .prop_map(|lines| {
        let mut text = lines.join("\n");
        text.push('\n');
        text
    })
}

/// Generate a fixture translation unit with exactly one entry point
fn fixture_source() -> impl Strategy<Value = String> {
    (
        prop::string::string_regex("[A-Z][A-Z0-9_]{0,12}").unwrap(),
        prop::string::string_regex("[0-9]{1,3}").unwrap(),
    )
        .prop_map(|(name, value)| {
            format!(
                "#include \"std_testcase.h\"\n\n#define {name} {value}\n\nvoid test_function()\n{{\n    char buffer[{name}];\n    buffer[0] = '\\0';\n}}\n"
            )
        })
}

// Property tests

proptest! {
    /// Stored fixture text is retrieved byte-for-byte
    #[test]
    fn source_text_round_trips(class in class_name(), tc in test_case_name(), body in fixture_body()) {
        let dir = tempdir().unwrap();
        let tc_dir = dir.path().join(&class).join(&tc);
        fs::create_dir_all(&tc_dir).unwrap();
        fs::write(tc_dir.join("item.c"), &body).unwrap();

        let corpus = Corpus::open(dir.path()).unwrap();
        let retrieved = corpus.source_text(&format!("{class}/{tc}/item.c")).unwrap();

        prop_assert_eq!(retrieved, body);
    }

    /// Indexing the same tree twice enumerates the same paths
    #[test]
    fn indexing_is_deterministic(cases in prop::collection::btree_set(
        (class_name(), test_case_name()), 1..10)
    ) {
        let dir = tempdir().unwrap();
        for (class, tc) in &cases {
            let tc_dir = dir.path().join(class).join(tc);
            fs::create_dir_all(&tc_dir).unwrap();
            fs::write(tc_dir.join("item.c"), "void test_function()\n{\n}\n").unwrap();
        }

        let first = Corpus::open(dir.path()).unwrap();
        let second = Corpus::open(dir.path()).unwrap();

        let a: Vec<&str> = first.test_cases().map(FixturePath::as_str).collect();
        let b: Vec<&str> = second.test_cases().map(FixturePath::as_str).collect();
        prop_assert_eq!(a, b);
    }

    /// Enumerated paths are unique
    #[test]
    fn enumerated_paths_are_unique(cases in prop::collection::btree_set(
        (class_name(), test_case_name()), 1..10)
    ) {
        let dir = tempdir().unwrap();
        for (class, tc) in &cases {
            let tc_dir = dir.path().join(class).join(tc);
            fs::create_dir_all(&tc_dir).unwrap();
            fs::write(tc_dir.join("item.c"), "void test_function()\n{\n}\n").unwrap();
        }

        let corpus = Corpus::open(dir.path()).unwrap();
        let paths: Vec<&str> = corpus.test_cases().map(FixturePath::as_str).collect();
        let mut deduped = paths.clone();
        deduped.sort();
        deduped.dedup();

        prop_assert_eq!(paths.len(), deduped.len());
    }

    /// Generated fixtures carry exactly one entry point and their declared
    /// constant is extracted
    #[test]
    fn generated_fixtures_verify_clean(source in fixture_source()) {
        let fixture = Fixture {
            path: FixturePath::new("class01/tc01"),
            files: vec![SourceFile { name: "item.c".to_string(), text: source }],
        };

        let meta = fixture.metadata();
        prop_assert_eq!(meta.entry_point_count, 1);
        prop_assert_eq!(meta.declared_constants.len(), 1);
        prop_assert!(meta.includes_testcase_header);
    }

    /// Checksums are stable across clones of the same content
    #[test]
    fn checksums_are_content_addressed(body in fixture_body()) {
        let a = SourceFile { name: "item.c".to_string(), text: body.clone() };
        let b = SourceFile { name: "other.c".to_string(), text: body };

        prop_assert_eq!(a.checksum(), b.checksum());
    }
}
