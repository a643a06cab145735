//! Source archive handling: download, integrity verification, and extraction.
//!
//! # Sub-modules
//!
//! - [`archive_format`] - Archive format detection (`ArchiveFormat`).
//! - [`download`] - Fetcher trait and HTTP implementation.
//! - [`extraction`] - Archive extraction with path traversal protection.
//! - [`filename`] - Destination filename inference.
//! - [`sha256_digest`] - SHA-256 digest newtype (`Sha256Digest`).
//! - [`verification`] - Streamed SHA-256 verification.

pub mod archive_format;
pub mod download;
pub mod extraction;
pub mod filename;
pub mod sha256_digest;
pub mod verification;
