//! Hand-off of an unpacked package root to the external package manager.
//!
//! [`ConanRegistrar`] runs `<program> export <root> --name <name>
//! [--user <user>] [--channel <channel>]` through a [`CommandExecutor`].
//! The registrar's own standard output reaches the terminal unless the
//! registrar is quiet; standard error is always captured for failure reports.

use crate::deps::{CommandExecutor, SystemCommandExecutor};
use crate::namespace::Namespace;
use crate::package_name::PackageName;
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

/// Default registrar program.
pub const DEFAULT_PROGRAM: &str = "conan";

/// Errors arising from exporting a package.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The registrar program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The registrar exited unsuccessfully.
    #[error("export of {name} failed ({status}): {stderr}")]
    Failed {
        /// Package being exported.
        name: PackageName,
        /// Exit status of the registrar.
        status: ExitStatus,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The package root cannot be passed as a UTF-8 argument.
    #[error("package root {} is not valid UTF-8", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },
}

/// Registers an unpacked package root with the package manager.
#[cfg_attr(test, mockall::automock)]
pub trait Registrar {
    /// Export the recipe at `root` as `name` in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] when the registrar cannot be run or
    /// reports failure.
    fn export(
        &self,
        root: &Path,
        name: &PackageName,
        namespace: &Namespace,
    ) -> Result<(), RegistrationError>;
}

/// Registrar backed by the `conan` command line.
#[derive(Debug, Clone)]
pub struct ConanRegistrar<E = SystemCommandExecutor> {
    executor: E,
    program: String,
    quiet: bool,
}

impl ConanRegistrar {
    /// Create a registrar running `program` on the host system.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_executor(SystemCommandExecutor, program)
    }
}

impl<E: CommandExecutor> ConanRegistrar<E> {
    /// Create a registrar running `program` through `executor`.
    #[must_use]
    pub fn with_executor(executor: E, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
            quiet: false,
        }
    }

    /// Capture the registrar's standard output instead of echoing it.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// The configured program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ConanRegistrar {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

/// Build the `export` argument list.
///
/// # Examples
///
/// ```
/// use recipe_installer::namespace::Namespace;
/// use recipe_installer::registrar::export_args;
///
/// let ns = Namespace::new(Some("acme".into()), None);
/// assert_eq!(
///     export_args("/tmp/zlib-1.3", "zlib", &ns),
///     ["export", "/tmp/zlib-1.3", "--name", "zlib", "--user", "acme"],
/// );
/// ```
#[must_use]
pub fn export_args<'a>(root: &'a str, name: &'a str, namespace: &'a Namespace) -> Vec<&'a str> {
    let mut args = vec!["export", root, "--name", name];
    if let Some(user) = namespace.user() {
        args.extend(["--user", user]);
    }
    if let Some(channel) = namespace.channel() {
        args.extend(["--channel", channel]);
    }
    args
}

impl<E: CommandExecutor> Registrar for ConanRegistrar<E> {
    fn export(
        &self,
        root: &Path,
        name: &PackageName,
        namespace: &Namespace,
    ) -> Result<(), RegistrationError> {
        let root_str = root.to_str().ok_or_else(|| RegistrationError::NonUtf8Path {
            path: root.to_path_buf(),
        })?;
        let args = export_args(root_str, name.as_str(), namespace);
        info!("running {} {}", self.program, args.join(" "));

        let output = if self.quiet {
            self.executor.run(&self.program, &args)
        } else {
            self.executor.run_echoing(&self.program, &args)
        };
        let output = output.map_err(|source| RegistrationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RegistrationError::Failed {
                name: name.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use rstest::rstest;

    fn ns(user: Option<&str>, channel: Option<&str>) -> Namespace {
        Namespace::new(user.map(str::to_owned), channel.map(str::to_owned))
    }

    #[rstest]
    #[case::bare(None, None, vec!["export", "/r", "--name", "pkg"])]
    #[case::user(Some("u"), None, vec!["export", "/r", "--name", "pkg", "--user", "u"])]
    #[case::both(
        Some("u"),
        Some("c"),
        vec!["export", "/r", "--name", "pkg", "--user", "u", "--channel", "c"]
    )]
    fn builds_export_arguments(
        #[case] user: Option<&str>,
        #[case] channel: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let namespace = ns(user, channel);
        assert_eq!(export_args("/r", "pkg", &namespace), expected);
    }

    #[test]
    fn export_runs_configured_program() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "conan2",
            args: vec![
                "export",
                "/stage/zlib-1.3",
                "--name",
                "zlib",
                "--user",
                "acme",
                "--channel",
                "stable",
            ],
            result: Ok(success_output()),
        }]);
        let registrar = ConanRegistrar::with_executor(&executor, "conan2");

        registrar
            .export(
                Path::new("/stage/zlib-1.3"),
                &PackageName::from("zlib"),
                &ns(Some("acme"), Some("stable")),
            )
            .expect("export");
        executor.assert_finished();
        assert_eq!(executor.echoed(), ["conan2"]);
    }

    #[test]
    fn quiet_registrar_captures_output() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "conan",
            args: vec!["export", "/stage", "--name", "zlib"],
            result: Ok(success_output()),
        }]);
        let registrar = ConanRegistrar::with_executor(&executor, "conan").quiet(true);

        registrar
            .export(
                Path::new("/stage"),
                &PackageName::from("zlib"),
                &Namespace::default(),
            )
            .expect("export");
        executor.assert_finished();
        assert!(executor.echoed().is_empty());
    }

    #[test]
    fn nonzero_exit_carries_status_and_trimmed_stderr() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "conan",
            args: vec!["export", "/stage", "--name", "zlib"],
            result: Ok(failure_output("ERROR: recipe invalid\n")),
        }]);
        let registrar = ConanRegistrar::with_executor(&executor, "conan");

        let err = registrar
            .export(
                Path::new("/stage"),
                &PackageName::from("zlib"),
                &Namespace::default(),
            )
            .expect_err("failure expected");
        match err {
            RegistrationError::Failed { name, status, stderr } => {
                assert_eq!(name.as_str(), "zlib");
                assert_eq!(status.code(), Some(1));
                assert_eq!(stderr, "ERROR: recipe invalid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn spawn_failure_is_reported() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "conan",
            args: vec!["export", "/stage", "--name", "zlib"],
            result: Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no conan")),
        }]);
        let registrar = ConanRegistrar::with_executor(&executor, "conan");

        let err = registrar
            .export(
                Path::new("/stage"),
                &PackageName::from("zlib"),
                &Namespace::default(),
            )
            .expect_err("failure expected");
        assert!(matches!(err, RegistrationError::Spawn { .. }));
    }
}
