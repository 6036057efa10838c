//! BLAKE3 file fingerprinter with streaming support.
//!
//! # Overview
//!
//! Computes a content digest for a file by reading it in fixed-size chunks,
//! so working memory stays constant regardless of file size. The digest is
//! deterministic: identical bytes always produce identical digests, and any
//! byte difference yields a different digest with overwhelming probability.
//!
//! # Example
//!
//! ```no_run
//! use dupmove::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! match hasher.digest(Path::new("data.bin")) {
//!     Ok(digest) => println!("{}", digest),
//!     Err(e) => eprintln!("Warning: {}", e),
//! }
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::HashError;

/// A full-content BLAKE3 digest.
pub type Digest = blake3::Hash;

/// Read chunk size for streaming hash computation.
///
/// 64 KiB keeps syscall overhead low while bounding working memory.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Streaming file fingerprinter.
///
/// Stateless; one instance can digest any number of files. The file handle
/// opened per call is dropped on every exit path, including errors.
#[derive(Debug, Default, Clone)]
pub struct Hasher;

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the full-content digest of the file at `path`.
    ///
    /// Reads the file in [`CHUNK_SIZE`] pieces; the whole file is never
    /// resident in memory. On any read failure the error is returned as a
    /// typed [`HashError`] naming the path, never a panic, so callers can
    /// skip the file and continue with the rest of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotFound`] if the file vanished since
    /// discovery, [`HashError::PermissionDenied`] if it cannot be read,
    /// or [`HashError::Io`] for any other I/O failure mid-stream.
    pub fn digest(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(hasher.finalize())
    }
}
