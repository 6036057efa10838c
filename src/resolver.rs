//! Duplicate resolver and mover.
//!
//! # Overview
//!
//! Phase two of matching: walk the candidate tree, query the reference
//! index per file, and relocate confirmed duplicates into a flat
//! destination directory. The size-keyed path is lazy about digests: a
//! candidate is only fingerprinted when its size bucket exists, and each
//! reference file is fingerprinted at most once per run (memoized).
//!
//! Within a bucket the first equal digest wins. This is a deliberate
//! "first sufficient match" policy, not a search for a best match; once a
//! duplicate is confirmed, no further bucket members are checked.
//!
//! Directory structure under the candidate root is collapsed on the move:
//! files land directly in the destination under their base filename. A
//! name already present at the destination fails that one move; the walk
//! continues.
//!
//! Every per-file failure (stat, unreadable content, move collision) is
//! caught here, logged, counted, and isolated to that file. Only a missing
//! candidate root aborts the run.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::index::{DigestIndex, SizeIndex};
use crate::scanner::{Digest, FileEntry, Hasher, ScanError, Walker, WalkerConfig};

/// Error type for relocation of a single confirmed duplicate.
#[derive(Debug, Error)]
pub enum MoveError {
    /// A file with the same base name already exists at the destination.
    #[error("destination already has a file named {name}: {path}")]
    DestinationExists {
        /// Base filename that collided.
        name: String,
        /// Full destination path that was occupied.
        path: PathBuf,
    },

    /// The candidate path has no usable base filename.
    #[error("no base filename for {0}")]
    NoFileName(PathBuf),

    /// The destination directory could not be created.
    #[error("cannot create destination directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The move itself failed.
    #[error("cannot move {from} to {to}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which reference index the resolver consults.
#[derive(Debug)]
pub enum ReferenceIndex {
    /// Size-keyed buckets; candidates are confirmed by digest comparison
    /// against bucket members.
    Size(SizeIndex),
    /// Digest-keyed exact lookup; every candidate is fingerprinted.
    Digest(DigestIndex),
}

/// How a candidate file was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    /// Not a duplicate; leave it in place.
    Unique,
    /// Confirmed duplicate of this reference path.
    DuplicateOf(PathBuf),
}

/// Counters and failures accumulated over one resolve run.
#[derive(Debug, Default)]
pub struct MoveStats {
    /// Files relocated to the destination.
    pub moved: usize,
    /// Total bytes relocated.
    pub bytes_moved: u64,
    /// Files left in place because nothing in the reference tree matched.
    pub unique: usize,
    /// Per-file failures, with the path and the reason. These never
    /// aborted the walk.
    pub failures: Vec<(PathBuf, String)>,
}

impl MoveStats {
    /// True if at least one per-file failure occurred.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn record_failure(&mut self, path: &Path, reason: impl ToString) {
        self.failures.push((path.to_path_buf(), reason.to_string()));
    }
}

/// Walks a candidate tree and relocates confirmed duplicates.
pub struct Resolver {
    index: ReferenceIndex,
    dest: PathBuf,
    config: WalkerConfig,
    hasher: Hasher,
    /// Reference digests computed so far this run. `None` marks a
    /// reference file that turned out to be unreadable, so it is not
    /// retried for every candidate in the same bucket.
    reference_digests: HashMap<PathBuf, Option<Digest>>,
}

impl Resolver {
    /// Create a resolver over a prebuilt reference index.
    ///
    /// # Arguments
    ///
    /// * `index` - Read-only index produced by [`crate::index::IndexBuilder`]
    /// * `dest` - Destination directory, created on demand
    /// * `config` - Walk configuration for the candidate tree
    #[must_use]
    pub fn new(index: ReferenceIndex, dest: &Path, config: WalkerConfig) -> Self {
        // Canonical form so the inside-candidate guard still matches a
        // destination given through a symlink or a non-canonical spelling.
        // A destination that does not exist yet cannot be canonicalized;
        // it is used as given and created on demand.
        let dest = dest
            .canonicalize()
            .unwrap_or_else(|_| dest.to_path_buf());
        Self {
            index,
            dest,
            config,
            hasher: Hasher::new(),
            reference_digests: HashMap::new(),
        }
    }

    /// Resolve and move duplicates under `candidate_root`.
    ///
    /// Walks the candidate tree once, classifying each regular,
    /// non-hidden file against the reference index and moving confirmed
    /// duplicates into the destination. Per-file errors are recorded in
    /// the returned [`MoveStats`] and never abort the walk.
    ///
    /// # Errors
    ///
    /// Only a missing or non-directory candidate root is fatal.
    pub fn run(&mut self, candidate_root: &Path) -> Result<MoveStats, ScanError> {
        // Walked paths inherit the root's spelling; canonicalize so they
        // compare cleanly against the canonical destination
        let candidate_root = candidate_root
            .canonicalize()
            .unwrap_or_else(|_| candidate_root.to_path_buf());
        let walker = Walker::new(&candidate_root, self.config.clone());
        walker.verify_root()?;

        log::debug!(
            "resolving candidates under {} into {}",
            candidate_root.display(),
            self.dest.display()
        );

        let mut stats = MoveStats::default();

        for entry in walker.walk() {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("skipping candidate entry: {}", e);
                    if let Some(path) = scan_error_path(&e) {
                        stats.record_failure(path, &e);
                    }
                    continue;
                }
            };

            // If the destination sits inside the candidate tree, files we
            // already moved would be rediscovered; leave them alone.
            if file.path.parent() == Some(self.dest.as_path()) {
                log::trace!("already at destination: {}", file.path.display());
                continue;
            }

            self.process_candidate(&file, &mut stats);
        }

        log::debug!(
            "resolve complete: {} moved, {} unique, {} failures",
            stats.moved,
            stats.unique,
            stats.failures.len()
        );
        Ok(stats)
    }

    /// Classify one candidate and move it if confirmed.
    fn process_candidate(&mut self, file: &FileEntry, stats: &mut MoveStats) {
        let verdict = match self.classify(file) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("cannot fingerprint candidate: {}", e);
                stats.record_failure(&file.path, &e);
                return;
            }
        };

        match verdict {
            Verdict::Unique => {
                log::trace!("no duplicate for {}", file.path.display());
                stats.unique += 1;
            }
            Verdict::DuplicateOf(reference) => match self.move_to_dest(&file.path) {
                Ok(target) => {
                    log::debug!(
                        "moved {} -> {} (duplicate of {})",
                        file.path.display(),
                        target.display(),
                        reference.display()
                    );
                    stats.moved += 1;
                    stats.bytes_moved += file.size;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    stats.record_failure(&file.path, &e);
                }
            },
        }
    }

    /// Decide whether a candidate duplicates something in the reference
    /// index.
    ///
    /// Size-keyed: an absent bucket short-circuits to [`Verdict::Unique`]
    /// without computing any digest. Bucket members are compared in
    /// discovery order and the first equal digest wins.
    fn classify(&mut self, file: &FileEntry) -> Result<Verdict, crate::scanner::HashError> {
        match &self.index {
            ReferenceIndex::Size(index) => {
                let Some(bucket) = index.bucket(file.size) else {
                    return Ok(Verdict::Unique);
                };
                // Size match is necessary but not sufficient; confirm by
                // content.
                let candidate_digest = self.hasher.digest(&file.path)?;

                for reference in bucket {
                    let digest = Self::reference_digest(
                        &self.hasher,
                        &mut self.reference_digests,
                        reference,
                    );
                    if digest == Some(candidate_digest) {
                        return Ok(Verdict::DuplicateOf(reference.clone()));
                    }
                }
                Ok(Verdict::Unique)
            }
            ReferenceIndex::Digest(index) => {
                let digest = self.hasher.digest(&file.path)?;
                Ok(match index.lookup(&digest) {
                    Some(reference) => Verdict::DuplicateOf(reference.to_path_buf()),
                    None => Verdict::Unique,
                })
            }
        }
    }

    /// The memoized digest of a reference file, computed at most once per
    /// run. Unreadable reference files are remembered as `None` and simply
    /// never match.
    fn reference_digest(
        hasher: &Hasher,
        memo: &mut HashMap<PathBuf, Option<Digest>>,
        reference: &Path,
    ) -> Option<Digest> {
        if let Some(known) = memo.get(reference) {
            return *known;
        }
        let digest = match hasher.digest(reference) {
            Ok(d) => Some(d),
            Err(e) => {
                log::warn!("cannot fingerprint reference file: {}", e);
                None
            }
        };
        memo.insert(reference.to_path_buf(), digest);
        digest
    }

    /// Move a confirmed duplicate into the destination directory,
    /// collapsing its directory structure to the base filename.
    fn move_to_dest(&self, from: &Path) -> Result<PathBuf, MoveError> {
        let name = from
            .file_name()
            .ok_or_else(|| MoveError::NoFileName(from.to_path_buf()))?;

        fs::create_dir_all(&self.dest).map_err(|source| MoveError::CreateDir {
            path: self.dest.clone(),
            source,
        })?;

        let target = self.dest.join(name);
        if target.symlink_metadata().is_ok() {
            return Err(MoveError::DestinationExists {
                name: name.to_string_lossy().into_owned(),
                path: target,
            });
        }

        move_file(from, &target).map_err(|source| MoveError::Io {
            from: from.to_path_buf(),
            to: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

/// Rename, falling back to copy-then-remove for cross-device targets.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // EXDEV and friends; a plain rename cannot cross filesystems
            log::trace!(
                "rename failed ({}), copying {} instead",
                rename_err,
                from.display()
            );
            if let Err(copy_err) = fs::copy(from, to) {
                // A half-written file must not squat on the destination
                // name; later runs would report it as a collision forever
                let _ = fs::remove_file(to);
                return Err(copy_err);
            }
            fs::remove_file(from)
        }
    }
}

fn scan_error_path(error: &ScanError) -> Option<&Path> {
    match error {
        ScanError::PermissionDenied(p)
        | ScanError::NotFound(p)
        | ScanError::NotADirectory(p)
        | ScanError::Io { path: p, .. } => Some(p),
    }
}
