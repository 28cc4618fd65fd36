//! Error types for corpus operations.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for corpus operations.
///
/// The corpus is static data, so "fixture not found" is the only
/// domain-specific failure; the remaining variants wrap filesystem and
/// summary-file problems.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// Corpus root directory does not exist.
    #[error("corpus root does not exist: '{0}'")]
    RootNotFound(PathBuf),

    /// Corpus root exists but is not a directory.
    #[error("not a directory: '{0}'")]
    NotADirectory(PathBuf),

    /// No fixture indexed under the given identifier.
    #[error("fixture not found: '{0}'")]
    FixtureNotFound(String),

    /// Destination of a copy/extract/inverse operation already exists.
    #[error("destination already exists: '{0}' (pass force to overwrite)")]
    DestinationExists(PathBuf),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Summary file could not be parsed or written.
    #[error("malformed summary file: {0}")]
    Summary(#[from] serde_json::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, CorpusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_not_found_message() {
        let err = CorpusError::FixtureNotFound("class01/tc99".to_string());
        assert_eq!(err.to_string(), "fixture not found: 'class01/tc99'");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CorpusError = io.into();
        assert!(matches!(err, CorpusError::Io(_)));
    }
}
