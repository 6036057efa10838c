//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! Sequential, deterministic traversal of a directory tree, yielding one
//! [`FileEntry`] per regular file. Hidden (dot-prefixed) entries are pruned
//! when configured, so a hidden directory's whole subtree is skipped in one
//! step. Per-entry errors are yielded inline as [`ScanError`] values rather
//! than stopping the walk; only callers decide whether any of them matter.
//!
//! Entries within each directory are visited in name order, which makes
//! index bucket order reproducible across runs on the same tree.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for sequential file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// The root this walker was created for.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Verify that the root exists and is a directory.
    ///
    /// This is the only fatal precondition of a walk; everything after it
    /// degrades per file. Callers check it before starting any work.
    ///
    /// # Errors
    ///
    /// [`ScanError::NotFound`] if the root does not exist,
    /// [`ScanError::NotADirectory`] if it exists but is not a directory.
    pub fn verify_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanError::NotFound(self.root.clone()))
            }
            Err(e) => Err(ScanError::Io {
                path: self.root.clone(),
                source: e,
            }),
        }
    }

    /// Whether a directory entry is hidden (dot-prefixed basename).
    fn is_hidden(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the tree, yielding file entries.
    ///
    /// Returns an iterator over [`FileEntry`] results. Errors are yielded
    /// as [`ScanError`] values rather than stopping iteration, so one
    /// unreadable entry never poisons the rest of the walk. Directories
    /// and symlinks are silently skipped; only regular files are yielded.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;
        let root = self.root.clone();

        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                // Never prune the root itself, even if its own name is dotted
                entry.path() == root || !(skip_hidden && Self::is_hidden(entry))
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(self.classify_walk_error(path, e)))
                }
            })
    }

    /// Turn a walkdir entry into a `FileEntry`, or skip it.
    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileEntry, ScanError>> {
        let file_type = entry.file_type();

        // Only regular files participate in matching
        if file_type.is_dir() || file_type.is_symlink() {
            return None;
        }

        match entry.metadata() {
            Ok(meta) => {
                if !meta.is_file() {
                    return None;
                }
                Some(Ok(FileEntry::new(entry.path().to_path_buf(), meta.len())))
            }
            Err(e) => {
                let path = entry.path().to_path_buf();
                let io = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                Some(Err(self.classify_io_error(path, io)))
            }
        }
    }

    /// Map a walkdir error onto our scan error taxonomy.
    fn classify_walk_error(&self, path: PathBuf, error: walkdir::Error) -> ScanError {
        log::warn!("walk error for {}: {}", path.display(), error);
        match error.into_io_error() {
            Some(io) => self.classify_io_error(path, io),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("directory loop detected"),
            },
        }
    }

    fn classify_io_error(&self, path: PathBuf, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => ScanError::PermissionDenied(path),
            ErrorKind::NotFound => ScanError::NotFound(path),
            _ => ScanError::Io {
                path,
                source: error,
            },
        }
    }
}
