//! Errors raised while discovering and parsing package descriptors.
//!
//! Every variant names the descriptor path, and the version key where one is
//! involved. Descriptor errors are fatal to a run.

use crate::artefact::sha256_digest::InvalidDigest;
use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Errors arising from descriptor discovery and parsing.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The recipes root directory does not exist.
    #[error("recipes directory {path} not found")]
    RootNotFound {
        /// The missing directory.
        path: Utf8PathBuf,
    },

    /// The discovery glob pattern is invalid.
    #[error("invalid descriptor pattern {pattern}: {source}")]
    Pattern {
        /// The rejected pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// A directory could not be read while scanning.
    #[error("failed to scan for descriptors: {0}")]
    Scan(#[from] glob::GlobError),

    /// A discovered path is not valid UTF-8.
    #[error("descriptor path {} is not valid UTF-8", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// A descriptor file could not be read.
    #[error("failed to read descriptor {path}: {source}")]
    Read {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A descriptor is not well-formed YAML.
    #[error("malformed YAML in {path}: {source}")]
    Yaml {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The underlying parser error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The descriptor has no top-level `sources` key.
    #[error("{path} has no `sources` mapping")]
    MissingSources {
        /// The descriptor path.
        path: Utf8PathBuf,
    },

    /// `sources` is present but is not a mapping.
    #[error("`sources` in {path} must be a mapping of version to source")]
    SourcesNotMapping {
        /// The descriptor path.
        path: Utf8PathBuf,
    },

    /// A version key is not a scalar.
    #[error("{path} has a non-scalar version key: {key}")]
    InvalidVersionKey {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// Debug rendering of the rejected key.
        key: String,
    },

    /// Two version keys render to the same text (e.g. `1.0` and `"1.0"`).
    #[error("{path} declares version {version} more than once")]
    DuplicateVersion {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The repeated version.
        version: String,
    },

    /// A source entry is not a mapping.
    #[error("source for version {version} in {path} must be a mapping")]
    SourceNotMapping {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The version key.
        version: String,
    },

    /// A source entry has no `url`.
    #[error("source for version {version} in {path} has no url")]
    MissingUrl {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The version key.
        version: String,
    },

    /// A source field holds a sequence or mapping instead of a scalar.
    #[error("field `{field}` of version {version} in {path} must be a scalar")]
    InvalidField {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The version key.
        version: String,
        /// The offending field name.
        field: &'static str,
    },

    /// A declared `sha256` is not 64 hex characters.
    #[error("sha256 of version {version} in {path}: {source}")]
    InvalidSha256 {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The version key.
        version: String,
        /// The validation failure.
        #[source]
        source: InvalidDigest,
    },
}
