//! Integrity verification for downloaded source archives.
//!
//! The archive is streamed through SHA-256 in fixed-size chunks so that large
//! sources never need to fit in memory. A mismatch is a data-integrity fault,
//! not a transient condition, so nothing here retries.

use super::sha256_digest::Sha256Digest;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Read size used when streaming a file through the hasher.
const CHUNK_SIZE: usize = 64 * 1024;

/// Errors arising from archive verification.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// The computed digest differs from the declared one.
    #[error("{file_name} sha256 verification failed: expected {expected}, got {actual}")]
    Mismatch {
        /// Base name of the verified file.
        file_name: String,
        /// Digest declared by the descriptor.
        expected: Sha256Digest,
        /// Digest computed from the file contents.
        actual: Sha256Digest,
    },

    /// The file could not be read for hashing.
    #[error("failed to read {path} for verification: {source}")]
    Unreadable {
        /// Path of the unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Compute the SHA-256 digest of a file.
///
/// # Errors
///
/// Returns [`IntegrityError::Unreadable`] if the file cannot be opened or read.
pub fn compute_sha256(path: &Path) -> Result<Sha256Digest, IntegrityError> {
    let unreadable = |source| IntegrityError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(unreadable)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer).map_err(unreadable)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    let hex = format!("{:x}", hasher.finalize());
    Sha256Digest::try_from(hex).map_err(|e| IntegrityError::Unreadable {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })
}

/// Verify that the file at `path` hashes to `expected`.
///
/// # Errors
///
/// Returns [`IntegrityError::Mismatch`] with the file name, the declared
/// digest, and the computed digest when they differ, or
/// [`IntegrityError::Unreadable`] when the file cannot be read.
pub fn verify_sha256(path: &Path, expected: &Sha256Digest) -> Result<(), IntegrityError> {
    let actual = compute_sha256(path)?;
    if &actual != expected {
        return Err(IntegrityError::Mismatch {
            file_name: path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            expected: expected.clone(),
            actual,
        });
    }
    Ok(())
}
