//! Recipe installer library.
//!
//! This crate bulk-imports externally hosted recipe sources into a local Conan
//! cache. It is used by the `recipe-installer` CLI binary and can be driven
//! programmatically for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Downloading, verifying, and unpacking source archives
//! - [`cli`] - Command-line argument definitions and settings resolution
//! - [`config`] - Optional TOML configuration file
//! - [`deps`] - External command execution and the registrar pre-flight check
//! - [`descriptor`] - Discovery and parsing of per-package source descriptors
//! - [`error`] - Errors that abort a run
//! - [`install`] - Whole-run orchestration
//! - [`namespace`] - Optional `user`/`channel` registration namespace
//! - [`output`] - Human-readable progress and summary lines
//! - [`package_name`] - Semantic wrapper for package names
//! - [`pipeline`] - Per-pair fetch, verify, and stage loop
//! - [`progress`] - Download progress reporting
//! - [`registrar`] - Export of staged recipes into the cache
//! - [`stager`] - Temporary staging and package-root detection

pub mod artefact;
pub mod cli;
pub mod config;
pub mod deps;
pub mod descriptor;
pub mod error;
pub mod install;
pub mod namespace;
pub mod output;
pub mod package_name;
pub mod pipeline;
pub mod progress;
pub mod registrar;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
