//! Whole-run orchestration shared by the binary and the integration tests.
//!
//! [`install`] discovers descriptors, applies the `--package` filter, runs the
//! registrar pre-flight check, and drives the [`Pipeline`]. Collaborators are
//! passed in through [`Toolkit`] so tests can substitute network and process
//! access.

use crate::artefact::download::Fetcher;
use crate::artefact::extraction::ArchiveExtractor;
use crate::cli::Settings;
use crate::deps::{CommandExecutor, check_registrar};
use crate::descriptor::{PackageDescriptor, discover};
use crate::error::{InstallerError, Result};
use crate::output::{dry_run_text, summary_text};
use crate::package_name::PackageName;
use crate::pipeline::Pipeline;
use crate::registrar::Registrar;
use crate::stager::Stager;
use camino::Utf8Path;
use log::info;
use std::io::Write;

/// Collaborators used by a run.
pub struct Toolkit<'a> {
    /// Downloads source archives.
    pub fetcher: &'a dyn Fetcher,
    /// Unpacks downloaded archives.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Exports staged recipes.
    pub registrar: &'a dyn Registrar,
    /// Runs the registrar pre-flight check.
    pub executor: &'a dyn CommandExecutor,
}

impl std::fmt::Debug for Toolkit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit").finish_non_exhaustive()
    }
}

/// Run an import with `settings`, writing progress to `out`.
///
/// Returns the process exit code: `0` when every pair succeeded or for a dry
/// run, `1` when any pair failed.
///
/// # Errors
///
/// Returns an [`InstallerError`] for failures that abort the run: an
/// unreadable recipes root, a malformed descriptor, an unknown `--package`,
/// or a registrar that fails the pre-flight check.
pub fn install(settings: &Settings, tools: &Toolkit<'_>, out: &mut dyn Write) -> Result<i32> {
    let discovered = discover(&settings.recipes_dir, &settings.descriptor_file)?;
    let descriptors = select_packages(discovered, &settings.packages, &settings.recipes_dir)?;
    let pairs: usize = descriptors.iter().map(PackageDescriptor::len).sum();
    info!(
        "{} package(s) with {pairs} source(s) selected under {}",
        descriptors.len(),
        settings.recipes_dir
    );

    if settings.dry_run {
        emit(out, &dry_run_text(&descriptors))?;
        return Ok(0);
    }

    if !settings.skip_tool_check {
        check_registrar(tools.executor, &settings.conan)?;
    }

    let stager = Stager::new(tools.extractor, tools.registrar);
    let pipeline = Pipeline::new(tools.fetcher, stager).quiet(settings.quiet);
    let summary = pipeline.run(&descriptors, out);
    emit(out, &summary_text(&summary))?;
    Ok(summary.exit_code())
}

/// Write a report that the run's result depends on; unlike progress lines,
/// a failure here is fatal.
fn emit(out: &mut dyn Write, text: &str) -> Result<()> {
    writeln!(out, "{text}").map_err(|source| InstallerError::WriteFailed { source })
}

/// Keep only the descriptors named in `wanted`, in discovery order.
///
/// An empty `wanted` keeps everything.
///
/// # Errors
///
/// Returns [`InstallerError::PackageNotFound`] for the first requested name
/// that has no descriptor under `root`.
///
/// # Examples
///
/// ```
/// use camino::{Utf8Path, Utf8PathBuf};
/// use indexmap::IndexMap;
/// use recipe_installer::descriptor::PackageDescriptor;
/// use recipe_installer::install::select_packages;
/// use recipe_installer::package_name::PackageName;
///
/// let descriptor = |name: &str| PackageDescriptor {
///     name: PackageName::from(name),
///     path: Utf8PathBuf::from(format!("r/{name}/conandata.yml")),
///     sources: IndexMap::new(),
/// };
/// let all = vec![descriptor("fmt"), descriptor("zlib")];
/// let picked = select_packages(all, &[PackageName::from("zlib")], Utf8Path::new("r")).unwrap();
/// assert_eq!(picked.len(), 1);
/// assert_eq!(picked[0].name.as_str(), "zlib");
/// ```
pub fn select_packages(
    descriptors: Vec<PackageDescriptor>,
    wanted: &[PackageName],
    root: &Utf8Path,
) -> Result<Vec<PackageDescriptor>> {
    if wanted.is_empty() {
        return Ok(descriptors);
    }
    if let Some(missing) = wanted
        .iter()
        .find(|name| !descriptors.iter().any(|d| &d.name == *name))
    {
        return Err(InstallerError::PackageNotFound {
            name: missing.clone(),
            root: root.to_owned(),
        });
    }
    Ok(descriptors
        .into_iter()
        .filter(|d| wanted.contains(&d.name))
        .collect())
}
