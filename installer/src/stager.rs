//! Unpacking a source archive and registering the package root.
//!
//! Each archive is unpacked into its own scoped staging directory, which is
//! removed once registration finishes, whether it succeeded or not.

use crate::artefact::extraction::{ArchiveExtractor, ExtractionError};
use crate::namespace::{ConfigurationError, Namespace};
use crate::package_name::PackageName;
use crate::registrar::{Registrar, RegistrationError};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

/// Errors arising from staging and registering an archive.
#[derive(Debug, Error)]
pub enum StageError {
    /// The namespace is unusable; nothing was staged.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The archive could not be unpacked.
    #[error("failed to unpack archive: {0}")]
    Extraction(#[from] ExtractionError),

    /// The staging directory could not be created or read.
    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registrar rejected the package.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Outcome of a successful stage-and-register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPackage {
    /// Package that was registered.
    pub name: PackageName,
    /// Package root relative to the staging directory; `None` when the
    /// staging directory itself was the root.
    pub root: Option<PathBuf>,
    /// Number of archive entries written.
    pub entries: usize,
}

/// Unpacks archives and hands package roots to a [`Registrar`].
pub struct Stager<'a> {
    extractor: &'a dyn ArchiveExtractor,
    registrar: &'a dyn Registrar,
}

impl std::fmt::Debug for Stager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stager").finish_non_exhaustive()
    }
}

impl<'a> Stager<'a> {
    /// Create a stager from an extractor and a registrar.
    #[must_use]
    pub fn new(extractor: &'a dyn ArchiveExtractor, registrar: &'a dyn Registrar) -> Self {
        Self {
            extractor,
            registrar,
        }
    }

    /// Unpack `archive`, detect the package root, and export it as `name`.
    ///
    /// The namespace is checked before any directory is created. The staging
    /// directory is removed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] for an invalid namespace, an extraction
    /// failure, a staging I/O failure, or a registrar failure.
    pub fn stage_and_register(
        &self,
        archive: &Path,
        name: &PackageName,
        namespace: &Namespace,
    ) -> Result<StagedPackage, StageError> {
        namespace.validate()?;

        let staging = tempfile::Builder::new()
            .prefix("recipe-installer-stage-")
            .tempdir()?;
        let result = self.stage_in(&staging, archive, name, namespace);
        remove_staging(staging);
        result
    }

    fn stage_in(
        &self,
        staging: &TempDir,
        archive: &Path,
        name: &PackageName,
        namespace: &Namespace,
    ) -> Result<StagedPackage, StageError> {
        let entries = self.extractor.extract(archive, staging.path())?;
        debug!("unpacked {entries} entries into {}", staging.path().display());

        let root = detect_package_root(staging.path())?;
        info!("exporting {name} from {}", root.display());
        self.registrar.export(&root, name, namespace)?;

        Ok(StagedPackage {
            name: name.clone(),
            root: root
                .strip_prefix(staging.path())
                .ok()
                .filter(|rel| !rel.as_os_str().is_empty())
                .map(Path::to_path_buf),
            entries,
        })
    }
}

fn remove_staging(staging: TempDir) {
    let path = staging.path().to_path_buf();
    if let Err(err) = staging.close() {
        warn!("failed to remove staging directory {}: {err}", path.display());
    }
}

/// Return the single top-level entry of `dir`, or `dir` itself when it holds
/// zero or several entries.
///
/// # Errors
///
/// Returns an I/O error if `dir` cannot be listed.
pub fn detect_package_root(dir: &Path) -> std::io::Result<PathBuf> {
    let mut entries = std::fs::read_dir(dir)?;
    let Some(first) = entries.next().transpose()? else {
        return Ok(dir.to_path_buf());
    };
    if entries.next().transpose()?.is_some() {
        return Ok(dir.to_path_buf());
    }
    Ok(first.path())
}
