//! Recipe installer CLI entrypoint.
//!
//! This binary imports every source listed in the per-package descriptors
//! under the recipes root into the local Conan cache, then prints a summary.

use clap::Parser;
use log::LevelFilter;
use recipe_installer::artefact::download::HttpFetcher;
use recipe_installer::artefact::extraction::DetectingExtractor;
use recipe_installer::cli::{Cli, Settings};
use recipe_installer::config::InstallerConfig;
use recipe_installer::deps::SystemCommandExecutor;
use recipe_installer::error::Result;
use recipe_installer::install::{Toolkit, install};
use recipe_installer::output::write_line;
use recipe_installer::progress::reporter_for;
use recipe_installer::registrar::ConanRegistrar;
use std::io::Write;

/// Exit code for errors that abort the run.
const FATAL_EXIT_CODE: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    let exit_code = exit_code_for_run_result(run(&cli, &mut stdout), &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<i32> {
    let config = InstallerConfig::load(cli.config.as_deref())?;
    let settings = cli.resolve(config);
    run_with_settings(&settings, out)
}

fn run_with_settings(settings: &Settings, out: &mut dyn Write) -> Result<i32> {
    let fetcher = HttpFetcher::new(settings.fetch, reporter_for(settings.progress));
    let extractor = DetectingExtractor;
    let registrar = ConanRegistrar::new(settings.conan.clone()).quiet(settings.quiet);
    let executor = SystemCommandExecutor;
    let tools = Toolkit {
        fetcher: &fetcher,
        extractor: &extractor,
        registrar: &registrar,
        executor: &executor,
    };
    install(settings, &tools, out)
}

/// Map `-v` occurrences to a log level; `RUST_LOG` takes precedence.
fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(level_for(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn exit_code_for_run_result(result: Result<i32>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            write_line(stderr, format!("error: {err}"));
            FATAL_EXIT_CODE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_installer::error::InstallerError;
    use recipe_installer::package_name::PackageName;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    fn exit_code_passes_run_code_through(#[case] code: i32, #[case] expected: i32) {
        let mut stderr = Vec::new();
        assert_eq!(exit_code_for_run_result(Ok(code), &mut stderr), expected);
        assert!(stderr.is_empty());
    }

    #[test]
    fn fatal_error_is_printed_and_exits_two() {
        let err = InstallerError::PackageNotFound {
            name: PackageName::from("zlib"),
            root: "external_recipes".into(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 2);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("package zlib not found under external_recipes"));
    }

    #[rstest]
    #[case(0, LevelFilter::Warn)]
    #[case(1, LevelFilter::Info)]
    #[case(2, LevelFilter::Debug)]
    #[case(3, LevelFilter::Trace)]
    #[case(9, LevelFilter::Trace)]
    fn verbosity_maps_to_level(#[case] verbosity: u8, #[case] expected: LevelFilter) {
        assert_eq!(level_for(verbosity), expected);
    }

    #[test]
    fn missing_recipes_root_is_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path().join("absent").to_string_lossy().into_owned();
        let cli = Cli::parse_from([
            "recipe-installer",
            "--recipes-dir",
            root.as_str(),
            "--skip-tool-check",
        ]);
        let settings = cli.resolve(InstallerConfig::default());

        let mut out = Vec::new();
        let err = run_with_settings(&settings, &mut out).expect_err("missing root");
        assert!(err.to_string().contains("absent"));
    }
}
