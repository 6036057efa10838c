//! dupmove - Two-Phase Duplicate File Detector and Mover
//!
//! Builds an in-memory index over a reference directory tree (keyed by
//! file size, or by full-content BLAKE3 digest), then walks a candidate
//! tree and relocates every file whose content already exists in the
//! reference tree into a flat destination directory. Matching is a cheap
//! size pre-filter followed by streamed digest confirmation; moves collapse
//! directory structure and per-file errors never abort a run.

pub mod cli;
pub mod error;
pub mod index;
pub mod logging;
pub mod prompt;
pub mod resolver;
pub mod scanner;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;

use crate::cli::{Cli, IndexStrategy};
use crate::error::ExitCode;
use crate::index::IndexBuilder;
use crate::resolver::{ReferenceIndex, Resolver};
use crate::scanner::{Hasher, WalkerConfig};

/// The three directories a run operates on, after prompting and
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Source of truth for "already have this file".
    pub reference: PathBuf,
    /// Tree scanned for files duplicating the reference tree.
    pub candidate: PathBuf,
    /// Flat directory confirmed duplicates are moved into.
    pub dest: PathBuf,
}

impl RunPaths {
    /// Collect run paths from CLI arguments, prompting on stdin for any
    /// that were not supplied.
    ///
    /// # Errors
    ///
    /// Fails on stdin/stdout I/O errors or an empty answer; emptiness is a
    /// fatal precondition, not a per-file condition.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let reference = Self::path_or_prompt(&cli.reference, "Reference directory")?;
        let candidate = Self::path_or_prompt(&cli.candidate, "Candidate directory")?;
        let dest = Self::path_or_prompt(&cli.dest, "Destination directory")?;
        Ok(Self {
            reference,
            candidate,
            dest,
        })
    }

    fn path_or_prompt(arg: &Option<PathBuf>, label: &str) -> Result<PathBuf> {
        let path = match arg {
            Some(path) => path.clone(),
            None => {
                let answer = prompt::prompt_path(label)
                    .with_context(|| format!("failed reading {}", label.to_lowercase()))?;
                PathBuf::from(answer)
            }
        };
        if path.as_os_str().is_empty() {
            bail!("{} must not be empty", label.to_lowercase());
        }
        Ok(path)
    }

    /// Check the fatal preconditions: reference and candidate must exist
    /// as directories. The destination is created on demand later.
    ///
    /// # Errors
    ///
    /// Names the offending path; nothing has been scanned or moved yet
    /// when this fails.
    pub fn check_preconditions(&self) -> Result<()> {
        ensure_directory(&self.reference, "reference directory")?;
        ensure_directory(&self.candidate, "candidate directory")?;
        Ok(())
    }
}

fn ensure_directory(path: &Path, what: &str) -> Result<()> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("{} does not exist: {}", what, path.display()))?;
    if !meta.is_dir() {
        bail!("{} is not a directory: {}", what, path.display());
    }
    Ok(())
}

/// Run the application with parsed CLI arguments.
///
/// Phase one builds the reference index; phase two resolves and moves.
/// Returns the exit code describing the outcome.
///
/// # Errors
///
/// Only precondition failures (empty or missing root paths) and unexpected
/// I/O on the roots themselves error out; per-file problems are logged,
/// counted, and reflected in the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let paths = RunPaths::from_cli(&cli)?;
    paths.check_preconditions()?;

    let config = WalkerConfig {
        skip_hidden: !cli.include_hidden,
    };

    log::info!(
        "indexing reference tree {} ({:?} keyed)",
        paths.reference.display(),
        cli.index
    );
    let mut builder = IndexBuilder::new(&paths.reference, config.clone());
    let index = match cli.index {
        IndexStrategy::Size => ReferenceIndex::Size(builder.build()?),
        IndexStrategy::Digest => {
            ReferenceIndex::Digest(builder.build_digest_index(&Hasher::new())?)
        }
    };
    let index_skipped = builder.skipped();

    log::info!("resolving candidates under {}", paths.candidate.display());
    let mut resolver = Resolver::new(index, &paths.dest, config);
    let stats = resolver.run(&paths.candidate)?;

    if stats.has_failures() {
        log::warn!(
            "{} file(s) skipped due to per-file errors",
            stats.failures.len()
        );
    }

    // The one guaranteed line of output, even under --quiet
    println!(
        "Done! Moved {} file(s) ({}) to {}",
        stats.moved,
        ByteSize::b(stats.bytes_moved),
        paths.dest.display()
    );

    Ok(if stats.has_failures() || index_skipped > 0 {
        ExitCode::PartialSuccess
    } else if stats.moved > 0 {
        ExitCode::Success
    } else {
        ExitCode::NothingMoved
    })
}
