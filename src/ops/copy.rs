//! Whole-corpus copy operation.

use std::path::PathBuf;

use tracing::{debug, info};

use super::{copy_tree, prepare_destination, Processing};
use crate::corpus::Corpus;
use crate::error::Result;

/// Copy the entire corpus tree to a destination.
pub struct CopyCorpus {
    /// Destination root.
    pub to: PathBuf,
    /// Overwrite an existing destination.
    pub force: bool,
}

impl Processing for CopyCorpus {
    fn name(&self) -> &'static str {
        "copy_corpus"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!(
            "copying corpus at {:?} to {:?} (force={})",
            corpus.root(),
            self.to,
            self.force
        );

        prepare_destination(&self.to, self.force)?;
        copy_tree(corpus.root(), &self.to)?;

        info!("corpus copy succeeded");
        Ok(())
    }
}
