//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Sequential directory walking using walkdir
//! - Streaming content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file fingerprinting (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupmove::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{Digest, Hasher, CHUNK_SIZE};
pub use walker::Walker;

/// Metadata for a regular file discovered during a tree walk.
///
/// Carries only what the two-phase matcher needs: the path and the byte
/// length. Content digests are computed lazily by the resolver, never
/// stored here. Entries are transient; nothing survives across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new `FileEntry`.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// The base filename component, if the path has one.
    #[must_use]
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    /// Hidden directories are pruned, so their contents are never visited.
    pub skip_hidden: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self { skip_hidden: true }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file fingerprinting.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found (it may have vanished between
    /// discovery and read).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error against the path being read.
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
