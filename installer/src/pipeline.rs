//! Sequential import of every `(package, version)` pair.
//!
//! Each pair is fetched, optionally verified, staged, and registered before
//! the next one starts. A failing pair is reported and the loop moves on; the
//! run's outcome is collected into a [`RunSummary`].

use crate::artefact::download::{DownloadedArtifact, FetchError, Fetcher};
use crate::artefact::verification::{IntegrityError, verify_sha256};
use crate::descriptor::{PackageDescriptor, SourceSpec};
use crate::namespace::ConfigurationError;
use crate::output::{outcome_line, package_header, version_header, write_line};
use crate::package_name::PackageName;
use crate::stager::{StageError, StagedPackage, Stager};
use log::{debug, warn};
use std::io::Write;
use thiserror::Error;

/// Errors confined to a single pair; the run continues after any of them.
#[derive(Debug, Error)]
pub enum PairError {
    /// `channel` was declared without `user`; nothing was fetched.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The source could not be downloaded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The download does not match its declared digest.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Unpacking or registration failed.
    #[error(transparent)]
    Stage(#[from] StageError),
}

/// The result of processing one pair.
#[derive(Debug)]
pub struct PairOutcome {
    /// Package the pair belongs to.
    pub package: PackageName,
    /// Version key of the pair.
    pub version: String,
    /// What happened.
    pub result: Result<StagedPackage, PairError>,
}

impl PairOutcome {
    /// Whether the pair was registered.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered outcomes of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: Vec<PairOutcome>,
}

impl RunSummary {
    /// Record another outcome.
    pub fn push(&mut self, outcome: PairOutcome) {
        self.outcomes.push(outcome);
    }

    /// All outcomes in processing order.
    #[must_use]
    pub fn outcomes(&self) -> &[PairOutcome] {
        &self.outcomes
    }

    /// Number of pairs attempted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no pair was attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed pairs.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Failed outcomes in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Process exit code: `0` when every pair succeeded, `1` otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.failed() > 0)
    }
}

impl FromIterator<PairOutcome> for RunSummary {
    fn from_iter<I: IntoIterator<Item = PairOutcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Drives fetch, verify, and stage for every pair.
pub struct Pipeline<'a> {
    fetcher: &'a dyn Fetcher,
    stager: Stager<'a>,
    quiet: bool,
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline from a fetcher and a stager.
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher, stager: Stager<'a>) -> Self {
        Self {
            fetcher,
            stager,
            quiet: false,
        }
    }

    /// Suppress per-pair progress lines; failures are still reported.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Process every pair of `descriptors` in order, writing progress to
    /// `out`.
    pub fn run(&self, descriptors: &[PackageDescriptor], out: &mut dyn Write) -> RunSummary {
        let mut summary = RunSummary::default();
        for descriptor in descriptors {
            if !self.quiet {
                write_line(out, package_header(&descriptor.name));
            }
            for (version, source) in descriptor.entries() {
                if !self.quiet {
                    write_line(out, version_header(version));
                }
                let outcome = PairOutcome {
                    package: descriptor.name.clone(),
                    version: version.to_owned(),
                    result: self.process(&descriptor.name, source),
                };
                if !self.quiet || !outcome.is_success() {
                    write_line(out, outcome_line(&outcome));
                }
                summary.push(outcome);
            }
        }
        summary
    }

    /// Run one pair through fetch, verify, and stage.
    ///
    /// # Errors
    ///
    /// Returns the first [`PairError`] encountered. The downloaded artifact
    /// is discarded on every path.
    pub fn process(
        &self,
        name: &PackageName,
        source: &SourceSpec,
    ) -> Result<StagedPackage, PairError> {
        source.namespace.validate()?;

        let artifact = self.fetcher.fetch(&source.url, source.filename.as_deref())?;
        debug!("fetched {} for {name}", artifact.path().display());
        let result = self.verify_and_stage(&artifact, name, source);
        discard(artifact);
        result
    }

    fn verify_and_stage(
        &self,
        artifact: &DownloadedArtifact,
        name: &PackageName,
        source: &SourceSpec,
    ) -> Result<StagedPackage, PairError> {
        if let Some(expected) = &source.sha256 {
            verify_sha256(artifact.path(), expected)?;
            debug!("sha256 verified for {}", artifact.file_name());
        }
        Ok(self
            .stager
            .stage_and_register(artifact.path(), name, &source.namespace)?)
    }
}

fn discard(artifact: DownloadedArtifact) {
    let dir = artifact.dir().to_path_buf();
    if let Err(err) = artifact.discard() {
        warn!("failed to remove download directory {}: {err}", dir.display());
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
