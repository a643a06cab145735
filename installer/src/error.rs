//! Error types for the recipe installer CLI.
//!
//! [`InstallerError`] covers failures that abort a run. Failures confined to
//! a single `(package, version)` pair are [`crate::pipeline::PairError`]s and
//! never surface here.

use crate::descriptor::DescriptorError;
use crate::package_name::PackageName;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// Descriptor discovery or parsing failed.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration file {path}: {reason}")]
    ConfigFile {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Description of the read or parse error.
        reason: String,
    },

    /// A package selected with `--package` has no descriptor.
    #[error("package {name} not found under {root}")]
    PackageNotFound {
        /// Name of the missing package.
        name: PackageName,
        /// The recipes root that was searched.
        root: Utf8PathBuf,
    },

    /// The registrar program is missing or broken.
    #[error("registrar {program} is unavailable: {reason}; install it or pass --skip-tool-check")]
    RegistrarUnavailable {
        /// The program that was checked.
        program: String,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
