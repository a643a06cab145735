//! Package descriptors and their discovery.
//!
//! A descriptor declares, per version, where to fetch a package's source
//! archive and how to export it.
//!
//! # Sub-modules
//!
//! - [`discovery`] - Scans `<root>/*/<descriptor-file>`.
//! - [`error`] - `DescriptorError`.
//! - [`parser`] - YAML parsing of a single descriptor.

pub mod discovery;
pub mod error;
pub mod parser;

pub use discovery::discover;
pub use error::DescriptorError;

use crate::artefact::sha256_digest::Sha256Digest;
use crate::namespace::Namespace;
use crate::package_name::PackageName;
use camino::Utf8PathBuf;
use indexmap::IndexMap;

/// Where one version's source comes from and how it is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Absolute HTTP(S) URL of the source archive.
    pub url: String,
    /// Destination file name overriding inference.
    pub filename: Option<String>,
    /// Expected digest of the archive.
    pub sha256: Option<Sha256Digest>,
    /// Registrar user and channel.
    pub namespace: Namespace,
}

/// A parsed descriptor: the package and its sources keyed by version in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Package name, taken from the descriptor's parent directory.
    pub name: PackageName,
    /// Path of the descriptor file.
    pub path: Utf8PathBuf,
    /// Sources by version.
    pub sources: IndexMap<String, SourceSpec>,
}

impl PackageDescriptor {
    /// Iterate `(version, source)` pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SourceSpec)> {
        self.sources.iter().map(|(v, s)| (v.as_str(), s))
    }

    /// Number of declared versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no versions are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
