//! Human-readable output for the installer CLI.
//!
//! Progress and per-pair results go to stdout; fatal errors go to stderr.
//! Writes are best-effort: a closed pipe must not turn a finished import into
//! a failure.

use crate::descriptor::PackageDescriptor;
use crate::pipeline::{PairOutcome, RunSummary};
use std::fmt::Display;
use std::io::Write;

/// Write `message` followed by a newline, ignoring write failures.
pub fn write_line(out: &mut dyn Write, message: impl Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Line announcing a package.
#[must_use]
pub fn package_header(name: impl Display) -> String {
    format!("Adding {name} to the cache")
}

/// Line announcing one version of a package.
#[must_use]
pub fn version_header(version: &str) -> String {
    format!("\tExporting version {version}")
}

/// Line reporting the result of one pair.
#[must_use]
pub fn outcome_line(outcome: &PairOutcome) -> String {
    match &outcome.result {
        Ok(_) => format!("\tExported {} {}", outcome.package, outcome.version),
        Err(err) => format!(
            "\tFailed {} {}: {err}",
            outcome.package, outcome.version
        ),
    }
}

/// Final summary of a run.
///
/// # Example
///
/// ```
/// use recipe_installer::output::summary_text;
/// use recipe_installer::pipeline::RunSummary;
///
/// let summary = RunSummary::default();
/// assert_eq!(summary_text(&summary), "Exported 0 of 0 source(s); 0 failed");
/// ```
#[must_use]
pub fn summary_text(summary: &RunSummary) -> String {
    let mut text = format!(
        "Exported {} of {} source(s); {} failed",
        summary.succeeded(),
        summary.len(),
        summary.failed()
    );
    for outcome in summary.failures() {
        text.push('\n');
        text.push_str(&format!("  - {} {}", outcome.package, outcome.version));
    }
    text
}

/// Listing of the pairs a dry run would process.
#[must_use]
pub fn dry_run_text(descriptors: &[PackageDescriptor]) -> String {
    let mut lines = vec![
        "Dry run - nothing will be downloaded or exported".to_owned(),
        String::new(),
    ];
    for descriptor in descriptors {
        lines.push(format!("{} ({})", descriptor.name, descriptor.path));
        for (version, source) in descriptor.entries() {
            let mut line = format!("  {version}: {}", source.url);
            if let Some(name) = &source.filename {
                line.push_str(&format!(" -> {name}"));
            }
            if source.sha256.is_some() {
                line.push_str(" [sha256]");
            }
            let namespace = source.namespace.to_string();
            if !namespace.is_empty() {
                line.push(' ');
                line.push_str(&namespace);
            }
            lines.push(line);
        }
    }
    lines.join("\n")
}
