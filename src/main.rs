use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cwe_corpus::corpus::{Corpus, QueueOutcome};
use cwe_corpus::ops::{
    CopyCorpus, ExtractSample, InverseCorpus, RemoveComments, RemoveCppFiles,
    RemoveInterprocFiles, RemoveMainFunction, ReplaceFunctions, ReplaceVariables,
    ReplaceWideLiterals,
};

#[derive(Parser, Debug)]
#[command(name = "cwe-corpus")]
#[command(version)]
#[command(about = "Corpus manager for C weakness test-case fixtures")]
struct Args {
    /// Enable verbose logging (to stderr)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a corpus and print its shape
    Info {
        /// Corpus root directory
        root: PathBuf,
    },

    /// List test case identifiers
    List {
        /// Corpus root directory
        root: PathBuf,

        /// Restrict the listing to one class
        #[arg(long)]
        class: Option<String>,
    },

    /// Print a fixture's source text, or its metadata as JSON
    Show {
        /// Corpus root directory
        root: PathBuf,

        /// Fixture identifier (class/test-case)
        fixture: String,

        /// Print extracted metadata instead of source text
        #[arg(long)]
        metadata: bool,
    },

    /// Check corpus integrity properties
    Verify {
        /// Corpus root directory
        root: PathBuf,
    },

    /// Copy the corpus to a destination
    Copy {
        /// Corpus root directory
        root: PathBuf,

        /// Destination directory
        to: PathBuf,

        /// Overwrite an existing destination
        #[arg(long)]
        force: bool,
    },

    /// Extract a proportional per-class sample to a destination
    Extract {
        /// Corpus root directory
        root: PathBuf,

        /// Destination directory
        to: PathBuf,

        /// Requested sample size across all classes
        #[arg(short, long)]
        samples: usize,

        /// Keep enumeration order instead of shuffling
        #[arg(long)]
        no_shuffle: bool,

        /// Overwrite an existing destination
        #[arg(long)]
        force: bool,
    },

    /// Copy every test case absent from a reference corpus
    Inverse {
        /// Corpus root directory
        root: PathBuf,

        /// Reference corpus whose test cases are excluded
        from: PathBuf,

        /// Destination directory
        to: PathBuf,

        /// Overwrite an existing destination
        #[arg(long)]
        force: bool,
    },

    /// Run cleaning operations over the corpus, in flag order
    Clean {
        /// Corpus root directory
        root: PathBuf,

        /// Remove C++ translation units
        #[arg(long)]
        remove_cpp: bool,

        /// Remove interprocedural test case files
        #[arg(long)]
        remove_interproc: bool,

        /// Rewrite wide-char literals into call form
        #[arg(long)]
        replace_literals: bool,

        /// Remove `#ifdef INCLUDEMAIN` blocks
        #[arg(long)]
        remove_main: bool,

        /// Strip comments and blank lines
        #[arg(long)]
        remove_comments: bool,
    },

    /// Replace user identifiers with FUN/VAR tokens
    Tokenize {
        /// Corpus root directory
        root: PathBuf,

        /// Replace user-defined function names
        #[arg(long)]
        functions: bool,

        /// Replace user-defined variable names
        #[arg(long)]
        variables: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logging goes to stderr; stdout carries command output
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Info { root } => {
            let corpus = Corpus::open(root)?;
            println!("corpus: {}", corpus.root().display());
            println!(
                "classes: {}, test cases: {}",
                corpus.classes().len(),
                corpus.len()
            );
            for (class, stat) in corpus.classes().iter().zip(corpus.stats()) {
                let count = corpus.test_cases_for_class(class).count();
                println!("  {class}  {count} ({:.1}%)", stat * 100.0);
            }
        }

        Command::List { root, class } => {
            let corpus = Corpus::open(root)?;
            match class {
                Some(class) => {
                    for tc in corpus.test_cases_for_class(&class) {
                        println!("{tc}");
                    }
                }
                None => {
                    for tc in corpus.test_cases() {
                        println!("{tc}");
                    }
                }
            }
        }

        Command::Show {
            root,
            fixture,
            metadata,
        } => {
            let corpus = Corpus::open(root)?;
            let fixture = corpus.fixture(fixture.as_str())?;
            if metadata {
                let meta = fixture.metadata();
                let report = json!({
                    "path": fixture.path.as_str(),
                    "files": fixture
                        .files
                        .iter()
                        .map(|f| json!({ "name": &f.name, "checksum": f.checksum() }))
                        .collect::<Vec<_>>(),
                    "metadata": meta,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for file in &fixture.files {
                    print!("{}", file.text);
                }
            }
        }

        Command::Verify { root } => {
            let corpus = Corpus::open(root)?;
            let report = corpus.verify()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_clean() {
                anyhow::bail!("{} integrity violations found", report.violations.len());
            }
            info!("corpus verified: {} fixtures clean", report.fixtures);
        }

        Command::Copy { root, to, force } => {
            let mut corpus = Corpus::open(root)?;
            corpus.queue_operation(Box::new(CopyCorpus { to, force }));
            drain_queue(&mut corpus)?;
        }

        Command::Extract {
            root,
            to,
            samples,
            no_shuffle,
            force,
        } => {
            let mut corpus = Corpus::open(root)?;
            corpus.queue_operation(Box::new(ExtractSample {
                to,
                samples,
                shuffle: !no_shuffle,
                force,
            }));
            drain_queue(&mut corpus)?;
        }

        Command::Inverse {
            root,
            from,
            to,
            force,
        } => {
            let mut corpus = Corpus::open(root)?;
            corpus.queue_operation(Box::new(InverseCorpus { from, to, force }));
            drain_queue(&mut corpus)?;
        }

        Command::Clean {
            root,
            remove_cpp,
            remove_interproc,
            replace_literals,
            remove_main,
            remove_comments,
        } => {
            let mut corpus = Corpus::open(root)?;
            if remove_cpp {
                corpus.queue_operation(Box::new(RemoveCppFiles));
            }
            if remove_interproc {
                corpus.queue_operation(Box::new(RemoveInterprocFiles));
            }
            if replace_literals {
                corpus.queue_operation(Box::new(ReplaceWideLiterals));
            }
            if remove_main {
                corpus.queue_operation(Box::new(RemoveMainFunction));
            }
            if remove_comments {
                corpus.queue_operation(Box::new(RemoveComments));
            }
            drain_queue(&mut corpus)?;
        }

        Command::Tokenize {
            root,
            functions,
            variables,
        } => {
            let mut corpus = Corpus::open(root)?;
            if functions {
                corpus.queue_operation(Box::new(ReplaceFunctions));
            }
            if variables {
                corpus.queue_operation(Box::new(ReplaceVariables));
            }
            drain_queue(&mut corpus)?;
        }
    }

    Ok(())
}

/// Run the queued operations, surfacing a failed queue as a CLI error.
fn drain_queue(corpus: &mut Corpus) -> Result<()> {
    match corpus.process() {
        QueueOutcome::Completed => Ok(()),
        QueueOutcome::EmptyQueue => {
            info!("nothing to do");
            Ok(())
        }
        QueueOutcome::OperationFailed => {
            anyhow::bail!("operation queue failed; see log for details")
        }
    }
}
