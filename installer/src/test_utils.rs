//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour suites under `tests/`.

use crate::artefact::download::{DownloadedArtifact, FetchError, Fetcher};
use crate::deps::CommandExecutor;
use crate::namespace::Namespace;
use crate::package_name::PackageName;
use crate::registrar::{Registrar, RegistrationError};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "conan").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: std::io::Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    echoed: RefCell<Vec<String>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            echoed: RefCell::new(Vec::new()),
        }
    }

    /// Commands that were run with their output echoed to the terminal.
    #[must_use]
    pub fn echoed(&self) -> Vec<String> {
        self.echoed.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    /// # Panics
    ///
    /// Panics if the command or arguments differ from the next expected call.
    fn run(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(std::io::Error::other(format!(
                "unexpected command invocation: {cmd} {}",
                args.join(" ")
            )));
        };

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args.as_slice(), args);

        call.result
    }

    fn run_echoing(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        self.echoed.borrow_mut().push(cmd.to_owned());
        self.run(cmd, args)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write a `.tar.gz` archive at `path` holding `files` as `(name, contents)`.
///
/// # Errors
///
/// Returns any I/O error from creating or writing the archive.
pub fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) -> std::io::Result<()> {
    std::fs::write(path, tar_gz_bytes(files)?)
}

/// Build an in-memory `.tar.gz` archive holding `files`.
///
/// # Errors
///
/// Returns any I/O error raised while encoding.
pub fn tar_gz_bytes(files: &[(&str, &[u8])]) -> std::io::Result<Vec<u8>> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *contents)?;
    }
    builder.into_inner()?.finish()
}

/// Write a `.zip` archive at `path` holding `files` as `(name, contents)`.
///
/// Names are stored verbatim, so traversal entries such as `../x` can be
/// produced for negative tests.
///
/// # Errors
///
/// Returns any I/O or zip encoding error.
pub fn write_zip(path: &Path, files: &[(&str, &[u8])]) -> std::io::Result<()> {
    let mut writer = zip::ZipWriter::new(File::create(path)?);
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in files {
        writer
            .start_file(*name, options)
            .map_err(std::io::Error::other)?;
        writer.write_all(contents)?;
    }
    writer.finish().map_err(std::io::Error::other)?;
    Ok(())
}

/// A canned response for [`StubFetcher`].
#[derive(Debug)]
pub enum StubResponse {
    /// Serve `contents` under `file_name`.
    Archive {
        /// Destination file name.
        file_name: String,
        /// File contents.
        contents: Vec<u8>,
    },
    /// Fail with the given error.
    Fail(FetchError),
}

/// A fetcher that serves canned responses in order and records every request.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: RefCell<VecDeque<StubResponse>>,
    requests: RefCell<Vec<String>>,
    download_dirs: RefCell<Vec<PathBuf>>,
}

impl StubFetcher {
    /// Create a fetcher that answers successive requests with `responses`.
    #[must_use]
    pub fn new(responses: Vec<StubResponse>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
            download_dirs: RefCell::new(Vec::new()),
        }
    }

    /// Queue another response.
    pub fn push(&self, response: StubResponse) {
        self.responses.borrow_mut().push_back(response);
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Temporary directories handed out so far, in order.
    #[must_use]
    pub fn download_dirs(&self) -> Vec<PathBuf> {
        self.download_dirs.borrow().clone()
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, url: &str, filename: Option<&str>) -> Result<DownloadedArtifact, FetchError> {
        self.requests.borrow_mut().push(url.to_owned());
        match self.responses.borrow_mut().pop_front() {
            Some(StubResponse::Archive {
                file_name,
                contents,
            }) => {
                let artifact = DownloadedArtifact::create(filename.unwrap_or(&file_name))?;
                std::fs::write(artifact.path(), contents)?;
                self.download_dirs
                    .borrow_mut()
                    .push(artifact.dir().to_path_buf());
                Ok(artifact)
            }
            Some(StubResponse::Fail(err)) => Err(err),
            None => Err(FetchError::Transport {
                url: url.to_owned(),
                reason: "no stubbed response".to_owned(),
            }),
        }
    }
}

/// One recorded [`Registrar::export`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedExport {
    /// Package name passed to the registrar.
    pub name: PackageName,
    /// Namespace passed to the registrar.
    pub namespace: Namespace,
    /// Final component of the package root.
    pub root_name: String,
    /// Sorted names of the root's immediate children.
    pub root_listing: Vec<String>,
    /// The root path as passed.
    pub root: PathBuf,
}

/// A registrar that records exports and fails for selected packages.
#[derive(Debug, Default)]
pub struct RecordingRegistrar {
    exports: RefCell<Vec<RecordedExport>>,
    failing: Vec<PackageName>,
}

impl RecordingRegistrar {
    /// Create a registrar that fails for every package in `failing`.
    #[must_use]
    pub fn failing_for(failing: Vec<PackageName>) -> Self {
        Self {
            exports: RefCell::new(Vec::new()),
            failing,
        }
    }

    /// Exports recorded so far, in order.
    #[must_use]
    pub fn exports(&self) -> Vec<RecordedExport> {
        self.exports.borrow().clone()
    }
}

impl Registrar for RecordingRegistrar {
    fn export(
        &self,
        root: &Path,
        name: &PackageName,
        namespace: &Namespace,
    ) -> Result<(), RegistrationError> {
        let mut root_listing: Vec<String> = std::fs::read_dir(root)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        root_listing.sort();

        self.exports.borrow_mut().push(RecordedExport {
            name: name.clone(),
            namespace: namespace.clone(),
            root_name: root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            root_listing,
            root: root.to_path_buf(),
        });

        if self.failing.contains(name) {
            return Err(RegistrationError::Failed {
                name: name.clone(),
                status: exit_status(1),
                stderr: format!("ERROR: {name} rejected"),
            });
        }
        Ok(())
    }
}
