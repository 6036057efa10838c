//! Reference-tree indexes for duplicate lookup.
//!
//! # Overview
//!
//! Phase one of matching: scan the reference tree once and build an
//! in-memory lookup keyed by a discriminant. Two keyings implement the
//! same contract:
//!
//! - [`SizeIndex`] (primary): keyed by byte length, each bucket holding
//!   every reference path of that size in discovery order. Cheap to build;
//!   the resolver confirms candidates against bucket members by digest.
//! - [`DigestIndex`] (alternate): keyed directly by full-content digest,
//!   one representative path per digest. Expensive to build, O(1) exact
//!   lookup with no confirmation step.
//!
//! Both are built once per run by [`IndexBuilder`] and are read-only
//! afterward; the builder returns a finished value instead of mutating
//! shared state mid-walk. Index construction never touches the filesystem
//! beyond reads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::{Digest, Hasher, ScanError, Walker, WalkerConfig};

/// Immutable size-keyed index over a reference tree.
///
/// Within a bucket, paths appear in discovery order. Order carries no
/// meaning beyond making the resolver's first-match policy reproducible.
#[derive(Debug, Default)]
pub struct SizeIndex {
    buckets: HashMap<u64, Vec<PathBuf>>,
    files: usize,
}

impl SizeIndex {
    /// The bucket of reference paths with exactly this size, if any.
    #[must_use]
    pub fn bucket(&self, size: u64) -> Option<&[PathBuf]> {
        self.buckets.get(&size).map(Vec::as_slice)
    }

    /// Number of distinct sizes indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True if no reference file was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of reference files indexed.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files
    }
}

/// Immutable digest-keyed index over a reference tree.
///
/// Holds one representative path per digest; later files with an
/// already-seen digest keep the existing representative.
#[derive(Debug, Default)]
pub struct DigestIndex {
    entries: HashMap<Digest, PathBuf>,
}

impl DigestIndex {
    /// The representative reference path for this digest, if indexed.
    #[must_use]
    pub fn lookup(&self, digest: &Digest) -> Option<&Path> {
        self.entries.get(digest).map(PathBuf::as_path)
    }

    /// Number of distinct digests indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no reference file was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder that walks a reference tree and produces a finished index.
///
/// Per-file errors (stat failure, vanished file, unreadable content in the
/// digest variant) are logged and skipped; they never abort the build. The
/// only fatal error is a missing or non-directory root.
#[derive(Debug)]
pub struct IndexBuilder {
    walker: Walker,
    skipped: usize,
}

impl IndexBuilder {
    /// Create a builder for the given reference root.
    #[must_use]
    pub fn new(root: &Path, config: WalkerConfig) -> Self {
        Self {
            walker: Walker::new(root, config),
            skipped: 0,
        }
    }

    /// Number of reference files skipped due to per-file errors during the
    /// last build.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Build a size-keyed index.
    ///
    /// # Errors
    ///
    /// Only root preconditions are fatal; see [`Walker::verify_root`].
    pub fn build(&mut self) -> Result<SizeIndex, ScanError> {
        self.walker.verify_root()?;
        log::debug!(
            "indexing reference tree by size: {}",
            self.walker.root().display()
        );

        let mut index = SizeIndex::default();
        self.skipped = 0;

        for entry in self.walker.walk() {
            match entry {
                Ok(file) => {
                    log::trace!(
                        "indexed {} ({} bytes)",
                        file.path.display(),
                        file.size
                    );
                    index.buckets.entry(file.size).or_default().push(file.path);
                    index.files += 1;
                }
                Err(e) => {
                    log::warn!("skipping reference entry: {}", e);
                    self.skipped += 1;
                }
            }
        }

        log::debug!(
            "reference index built: {} files across {} size buckets ({} skipped)",
            index.files,
            index.len(),
            self.skipped
        );
        Ok(index)
    }

    /// Build a digest-keyed index, fingerprinting every reference file.
    ///
    /// # Errors
    ///
    /// Only root preconditions are fatal; unreadable reference files are
    /// logged and left out of the index.
    pub fn build_digest_index(&mut self, hasher: &Hasher) -> Result<DigestIndex, ScanError> {
        self.walker.verify_root()?;
        log::debug!(
            "indexing reference tree by digest: {}",
            self.walker.root().display()
        );

        let mut index = DigestIndex::default();
        self.skipped = 0;

        for entry in self.walker.walk() {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("skipping reference entry: {}", e);
                    self.skipped += 1;
                    continue;
                }
            };
            match hasher.digest(&file.path) {
                Ok(digest) => {
                    index.entries.entry(digest).or_insert(file.path);
                }
                Err(e) => {
                    log::warn!("skipping unreadable reference file: {}", e);
                    self.skipped += 1;
                }
            }
        }

        log::debug!(
            "reference index built: {} distinct digests ({} skipped)",
            index.len(),
            self.skipped
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn builder(dir: &TempDir) -> IndexBuilder {
        IndexBuilder::new(dir.path(), WalkerConfig::default())
    }

    #[test]
    fn test_build_groups_by_size() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), b"12345").unwrap();
        fs::write(dir.path().join("b.bin"), b"abcde").unwrap();
        fs::write(dir.path().join("c.bin"), b"xy").unwrap();

        let index = builder(&dir).build().unwrap();

        assert_eq!(index.file_count(), 3);
        assert_eq!(index.len(), 2);
        assert_eq!(index.bucket(5).unwrap().len(), 2);
        assert_eq!(index.bucket(2).unwrap().len(), 1);
        assert!(index.bucket(7).is_none());
    }

    #[test]
    fn test_build_bucket_order_follows_discovery() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bin"), b"12345").unwrap();
        fs::write(dir.path().join("b.bin"), b"abcde").unwrap();

        let index = builder(&dir).build().unwrap();
        let bucket = index.bucket(5).unwrap();

        // Walk order is name-sorted per directory
        assert!(bucket[0].ends_with("a.bin"));
        assert!(bucket[1].ends_with("b.bin"));
    }

    #[test]
    fn test_build_skips_hidden() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("seen.bin"), b"123").unwrap();
        fs::write(dir.path().join(".unseen"), b"123").unwrap();

        let index = builder(&dir).build().unwrap();
        assert_eq!(index.file_count(), 1);
    }

    #[test]
    fn test_build_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut builder =
            IndexBuilder::new(&dir.path().join("missing"), WalkerConfig::default());
        assert!(matches!(builder.build(), Err(ScanError::NotFound(_))));
    }

    #[test]
    fn test_digest_index_lookup() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.bin"), b"payload").unwrap();
        fs::write(dir.path().join("two.bin"), b"other payload").unwrap();

        let hasher = Hasher::new();
        let index = builder(&dir).build_digest_index(&hasher).unwrap();

        assert_eq!(index.len(), 2);
        let digest = blake3::hash(b"payload");
        assert!(index.lookup(&digest).unwrap().ends_with("one.bin"));
        assert!(index.lookup(&blake3::hash(b"absent")).is_none());
    }

    #[test]
    fn test_digest_index_keeps_first_representative() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("first.bin"), b"same").unwrap();
        fs::write(dir.path().join("second.bin"), b"same").unwrap();

        let hasher = Hasher::new();
        let index = builder(&dir).build_digest_index(&hasher).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index
            .lookup(&blake3::hash(b"same"))
            .unwrap()
            .ends_with("first.bin"));
    }
}
