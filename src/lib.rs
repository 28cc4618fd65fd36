//! Corpus manager for C weakness test-case fixtures.
//!
//! A corpus is a directory tree of standalone, intentionally flawed or
//! benign C samples (Juliet/CWE style), organized as class/test-case
//! directories, each sample exposing a single uniform `test_function` entry
//! point. This crate indexes such datasets, exposes read-only enumeration
//! and retrieval, verifies corpus integrity, and runs the dataset
//! preparation operations (copy, sample extraction, cleaning, tokenizing)
//! that precede external analysis tooling.

pub mod corpus;
pub mod error;
pub mod fixture;
pub mod ops;
pub mod summary;

pub use corpus::{Corpus, QueueOutcome, VerifyReport};
pub use error::{CorpusError, Result};
pub use fixture::{DeclaredConstant, Fixture, FixtureMetadata, FixturePath, SourceFile};
pub use summary::Summary;
