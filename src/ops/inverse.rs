//! Inverse subset extraction.

use std::path::PathBuf;

use tracing::{debug, info};

use super::{copy_summary, copy_test_case, prepare_destination, Processing};
use crate::corpus::Corpus;
use crate::error::Result;

/// Copy every test case NOT present in a reference corpus to a destination.
///
/// Used to build the complement of a previously extracted sample.
pub struct InverseCorpus {
    /// Reference corpus whose test cases are excluded.
    pub from: PathBuf,
    /// Destination root.
    pub to: PathBuf,
    /// Overwrite an existing destination.
    pub force: bool,
}

impl Processing for InverseCorpus {
    fn name(&self) -> &'static str {
        "inverse_corpus"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!(
            "extracting inverse corpus of {:?} from {:?} to {:?} (force={})",
            corpus.root(),
            self.from,
            self.to,
            self.force
        );

        prepare_destination(&self.to, self.force)?;
        let reference = Corpus::open(&self.from)?;

        for test_case in corpus.test_cases() {
            if !reference.contains(test_case) {
                copy_test_case(corpus.root(), &self.to, test_case)?;
            }
        }

        copy_summary(corpus.root(), &self.to)?;
        info!("inverse corpus creation succeeded");
        Ok(())
    }
}
