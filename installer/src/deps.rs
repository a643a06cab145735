//! External command execution and the registrar pre-flight check.
//!
//! The registrar is an opaque external program. This module provides the
//! [`CommandExecutor`] seam used to run it and the check that it is present
//! before any source is fetched.

use crate::error::{InstallerError, Result};
use std::process::{Command, Output, Stdio};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use recipe_installer::deps::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("conan", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output>;

    /// Runs a command whose standard output goes straight to the terminal.
    ///
    /// Only standard error is captured; the returned `stdout` is empty. The
    /// default forwards to [`CommandExecutor::run`].
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    fn run_echoing(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        self.run(cmd, args)
    }
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        Command::new(cmd).args(args).output()
    }

    fn run_echoing(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
    }
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for &T {
    fn run(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        (**self).run(cmd, args)
    }

    fn run_echoing(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        (**self).run_echoing(cmd, args)
    }
}

/// Checks that the registrar program runs, by invoking `<program> --version`.
///
/// # Errors
///
/// Returns [`InstallerError::RegistrarUnavailable`] when the program cannot
/// be spawned or exits unsuccessfully.
///
/// # Examples
///
/// ```no_run
/// use recipe_installer::deps::{check_registrar, SystemCommandExecutor};
///
/// check_registrar(&SystemCommandExecutor, "conan")?;
/// # Ok::<(), recipe_installer::error::InstallerError>(())
/// ```
pub fn check_registrar(executor: &dyn CommandExecutor, program: &str) -> Result<()> {
    let output = executor
        .run(program, &["--version"])
        .map_err(|e| InstallerError::RegistrarUnavailable {
            program: program.to_owned(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InstallerError::RegistrarUnavailable {
            program: program.to_owned(),
            reason: format!(
                "`{program} --version` exited with {}: {}",
                output.status,
                stderr.trim()
            ),
        });
    }

    log::debug!(
        "{program} available: {}",
        String::from_utf8_lossy(&output.stdout).trim()
    );
    Ok(())
}

#[cfg(test)]
mod tests;
