//! Command-line interface definitions.
//!
//! The primary surface is interactive: run `dupmove` with no arguments and
//! it prompts for the three directories on stdin. The same paths can be
//! given positionally to skip the prompts, which is what the tests and any
//! scripted use rely on.
//!
//! # Example
//!
//! ```bash
//! # Fully interactive
//! dupmove
//!
//! # Non-interactive, verbose diagnostics
//! dupmove -v ~/music ~/downloads/music ~/dup
//!
//! # Digest-keyed index (one-shot exact lookup, no size pre-filter)
//! dupmove --index digest ~/music ~/downloads/music ~/dup
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Two-phase duplicate file detector and mover.
///
/// Files under CANDIDATE whose content already exists under REFERENCE are
/// moved into DEST (flat, base filename only). Matching is size pre-filter
/// plus BLAKE3 confirmation; nothing else in either tree is touched.
#[derive(Debug, Parser)]
#[command(name = "dupmove")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Reference directory: the source of truth for "already have this file"
    #[arg(value_name = "REFERENCE")]
    pub reference: Option<PathBuf>,

    /// Candidate directory scanned for duplicates of reference files
    #[arg(value_name = "CANDIDATE")]
    pub candidate: Option<PathBuf>,

    /// Destination directory confirmed duplicates are moved into (created
    /// on demand)
    #[arg(value_name = "DEST")]
    pub dest: Option<PathBuf>,

    /// Reference index keying strategy
    #[arg(long, value_enum, default_value = "size")]
    pub index: IndexStrategy,

    /// Include hidden (dot-prefixed) files and directories in both trees
    #[arg(long)]
    pub include_hidden: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and the final summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// How the reference index is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexStrategy {
    /// Bucket reference files by byte length; confirm candidates by digest
    /// against bucket members (the general strategy).
    Size,
    /// Fingerprint every reference file up front; exact digest lookup per
    /// candidate.
    Digest,
}
