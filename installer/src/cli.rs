//! CLI argument definitions for the recipe installer.
//!
//! This module defines the command-line interface using clap and merges it
//! with the optional configuration file into the effective [`Settings`].

use crate::artefact::download::FetchSettings;
use crate::config::InstallerConfig;
use crate::package_name::PackageName;
use camino::Utf8PathBuf;
use clap::Parser;
use std::time::Duration;

/// Import external recipe sources into the local Conan cache.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "recipe-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Import external recipe sources into the local Conan cache.\n\n",
    "Every <recipes-dir>/<package>/conandata.yml is read. For each version under ",
    "its `sources` mapping the archive at `url` is downloaded, checked against ",
    "`sha256` when one is declared, unpacked, and exported with ",
    "`conan export <root> --name <package> [--user U] [--channel C]`.\n\n",
    "A failing version is reported and the run continues; the exit status is 1 ",
    "when any version failed and 2 when the run could not start.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Import everything under ./external_recipes:\n",
    "    $ recipe-installer\n\n",
    "  Import selected packages from another tree:\n",
    "    $ recipe-installer --recipes-dir vendor/recipes -p zlib -p fmt\n\n",
    "  Show what would be imported:\n",
    "    $ recipe-installer --dry-run\n\n",
    "CONFIGURATION:\n",
    "  recipe-installer.toml in the working directory (or --config FILE) may set\n",
    "  recipes-dir, descriptor-file, conan, progress, skip-tool-check,\n",
    "  connect-timeout-secs and timeout-secs. Flags override the file.",
))]
pub struct Cli {
    /// Directory holding one sub-directory per package [default: external_recipes].
    #[arg(long, value_name = "DIR", env = "RECIPE_INSTALLER_RECIPES_DIR")]
    pub recipes_dir: Option<Utf8PathBuf>,

    /// Descriptor file name inside each package directory [default: conandata.yml].
    #[arg(long, value_name = "NAME")]
    pub descriptor_file: Option<String>,

    /// Registrar program to run [default: conan].
    #[arg(long, value_name = "PROGRAM", env = "RECIPE_INSTALLER_CONAN")]
    pub conan: Option<String>,

    /// Import only the named package (can be repeated).
    #[arg(short, long, value_name = "NAME")]
    pub package: Vec<String>,

    /// Configuration file [default: ./recipe-installer.toml when present].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Do not draw download progress bars.
    #[arg(long)]
    pub no_progress: bool,

    /// List the sources that would be imported and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not check that the registrar runs before starting.
    #[arg(long)]
    pub skip_tool_check: bool,

    /// Upper bound in seconds on each download.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds allowed to establish a connection [default: 30].
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report failures and the final summary.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Effective settings after merging the configuration file and the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root holding one directory per package.
    pub recipes_dir: Utf8PathBuf,
    /// Descriptor file name.
    pub descriptor_file: String,
    /// Registrar program.
    pub conan: String,
    /// Packages to restrict the run to; empty means all.
    pub packages: Vec<PackageName>,
    /// Whether to draw progress bars.
    pub progress: bool,
    /// Whether to only list the work.
    pub dry_run: bool,
    /// Whether to skip the registrar pre-flight check.
    pub skip_tool_check: bool,
    /// Only report failures and the summary.
    pub quiet: bool,
    /// Network timeouts.
    pub fetch: FetchSettings,
}

impl Cli {
    /// Merge these flags over `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use recipe_installer::cli::Cli;
    /// use recipe_installer::config::InstallerConfig;
    ///
    /// let config = InstallerConfig {
    ///     conan: "conan2".to_owned(),
    ///     ..InstallerConfig::default()
    /// };
    /// let cli = Cli::parse_from(["recipe-installer", "--no-progress"]);
    /// let settings = cli.resolve(config);
    /// assert_eq!(settings.conan, "conan2");
    /// assert!(!settings.progress);
    /// ```
    #[must_use]
    pub fn resolve(&self, config: InstallerConfig) -> Settings {
        Settings {
            recipes_dir: self.recipes_dir.clone().unwrap_or(config.recipes_dir),
            descriptor_file: self.descriptor_file.clone().unwrap_or(config.descriptor_file),
            conan: self.conan.clone().unwrap_or(config.conan),
            packages: self.package.iter().map(|p| PackageName::from(p.as_str())).collect(),
            progress: config.progress && !self.no_progress && !self.quiet,
            dry_run: self.dry_run,
            skip_tool_check: self.skip_tool_check || config.skip_tool_check,
            quiet: self.quiet,
            fetch: FetchSettings {
                connect_timeout: Duration::from_secs(
                    self.connect_timeout.unwrap_or(config.connect_timeout_secs),
                ),
                timeout: self.timeout.or(config.timeout_secs).map(Duration::from_secs),
            },
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
