//! Proportional sample extraction.

use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::thread_rng;
use tracing::{debug, info};

use super::{copy_summary, copy_test_case, prepare_destination, Processing};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::fixture::FixturePath;

/// Extract a sampled subset of the corpus to a destination.
///
/// Each class contributes `floor(class_fraction * samples)` test cases, so
/// the class balance of the source corpus carries over; totals may undershoot
/// the requested size.
pub struct ExtractSample {
    /// Destination root.
    pub to: PathBuf,
    /// Requested sample size across all classes.
    pub samples: usize,
    /// Shuffle test cases before truncating each class.
    pub shuffle: bool,
    /// Overwrite an existing destination.
    pub force: bool,
}

impl Processing for ExtractSample {
    fn name(&self) -> &'static str {
        "extract_sample"
    }

    fn execute(&self, corpus: &mut Corpus) -> Result<()> {
        debug!(
            "extracting {} samples from corpus {:?} to {:?} (shuffle={}, force={})",
            self.samples,
            corpus.root(),
            self.to,
            self.shuffle,
            self.force
        );

        prepare_destination(&self.to, self.force)?;

        // Per-class counts are approximated from the class fractions.
        let per_class: Vec<usize> = corpus
            .stats()
            .iter()
            .map(|stat| (stat * self.samples as f64) as usize)
            .collect();

        for (index, class) in corpus.classes().iter().enumerate() {
            let mut test_cases: Vec<FixturePath> =
                corpus.test_cases_for_class(class).cloned().collect();

            if self.shuffle {
                test_cases.shuffle(&mut thread_rng());
            }
            test_cases.truncate(per_class[index]);

            for test_case in &test_cases {
                copy_test_case(corpus.root(), &self.to, test_case)?;
            }
        }

        copy_summary(corpus.root(), &self.to)?;
        info!("corpus extraction succeeded");
        Ok(())
    }
}
