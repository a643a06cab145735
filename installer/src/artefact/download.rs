//! Source archive download.
//!
//! Provides a trait-based abstraction for fetching a source archive into a
//! fresh temporary directory, enabling dependency injection for testing. The
//! production [`HttpFetcher`] uses `ureq`.

use super::filename::{filename_from_content_disposition, filename_from_url, is_bare_file_name};
use crate::progress::{NoProgress, ProgressReporter};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

/// Read size used when streaming a response body to disk.
const CHUNK_SIZE: usize = 64 * 1024;
/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors arising from fetching a source archive.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The URL is not a syntactically valid absolute HTTP(S) URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No usable destination filename could be determined.
    #[error("invalid source {url}: {reason}")]
    InvalidSource {
        /// The URL being fetched.
        url: String,
        /// Why no filename could be used.
        reason: String,
    },

    /// The server answered 404.
    #[error("source not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The server answered with another non-success status.
    #[error("download failed for {url}: HTTP status {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request failed below the HTTP layer.
    #[error("download failed for {url}: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// I/O error creating the temporary directory or writing the body.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// A downloaded file inside its own temporary directory.
///
/// The directory is removed when the artifact is dropped or
/// [discarded](Self::discard), so the file and its parent never outlive the
/// pair that fetched them.
#[derive(Debug)]
pub struct DownloadedArtifact {
    dir: TempDir,
    path: PathBuf,
}

impl DownloadedArtifact {
    /// Create a fresh, uniquely named temporary directory that will hold
    /// `file_name`. The file itself is not created.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn create(file_name: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("recipe-installer-download-")
            .tempdir()?;
        let path = dir.path().join(file_name);
        Ok(Self { dir, path })
    }

    /// Path of the downloaded file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the downloaded file.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path of the temporary directory holding the file.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the file and its temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails; the directory is then left behind.
    pub fn discard(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Trait for fetching a source archive, enabling test doubles.
pub trait Fetcher {
    /// Download `url` into a fresh temporary directory.
    ///
    /// When `filename` is given it is used verbatim as the destination base
    /// name; otherwise the name is inferred from the response metadata or the
    /// URL path.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for invalid URLs, unresolvable filenames,
    /// transport failures, non-success statuses, and write failures.
    fn fetch(&self, url: &str, filename: Option<&str>) -> Result<DownloadedArtifact, FetchError>;
}

/// HTTP(S) fetcher using `ureq`.
pub struct HttpFetcher {
    agent: ureq::Agent,
    progress: Box<dyn ProgressReporter>,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}

/// Network settings for [`HttpFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Upper bound on a whole request, including the body; `None` waits
    /// indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
        }
    }
}

impl HttpFetcher {
    /// Create a fetcher with the given settings and progress reporter.
    #[must_use]
    pub fn new(settings: FetchSettings, progress: Box<dyn ProgressReporter>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(settings.connect_timeout))
            .timeout_global(settings.timeout)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            progress,
        }
    }

    /// Decide the destination filename for `url`.
    fn resolve_filename(&self, url: &Url, explicit: Option<&str>) -> Result<String, FetchError> {
        if let Some(name) = explicit {
            if is_bare_file_name(name) {
                return Ok(name.to_owned());
            }
            return Err(FetchError::InvalidSource {
                url: url.to_string(),
                reason: format!("filename \"{name}\" must be a bare file name"),
            });
        }

        if let Some(name) = self.filename_from_headers(url) {
            debug!("using Content-Disposition filename {name} for {url}");
            return Ok(name);
        }

        filename_from_url(url).ok_or_else(|| FetchError::InvalidSource {
            url: url.to_string(),
            reason: "no filename in Content-Disposition or URL path".to_owned(),
        })
    }

    /// Issue a HEAD request and read the `Content-Disposition` filename.
    ///
    /// A failed HEAD request is treated as "no header"; the GET that follows
    /// reports real transport problems.
    fn filename_from_headers(&self, url: &Url) -> Option<String> {
        let response = match self.agent.head(url.as_str()).call() {
            Ok(response) => response,
            Err(err) => {
                debug!("HEAD {url} failed, falling back to URL path: {err}");
                return None;
            }
        };
        response
            .headers()
            .get("content-disposition")
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition)
    }

    fn download_to(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| map_ureq_error(url.as_str(), e))?;
        let total = response.body().content_length();
        let mut reader = response.into_body().into_reader();
        let mut file = File::create(dest)?;

        let result = copy_with_progress(&mut reader, &mut file, total, self.progress.as_ref());
        self.progress.finish();
        let written = result.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        file.flush()?;
        Ok(written)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchSettings::default(), Box::new(NoProgress))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, filename: Option<&str>) -> Result<DownloadedArtifact, FetchError> {
        let parsed = parse_source_url(url)?;
        let file_name = self.resolve_filename(&parsed, filename)?;
        let artifact = DownloadedArtifact::create(&file_name)?;

        info!("downloading {url} to {}", artifact.path().display());
        let written = self.download_to(&parsed, artifact.path())?;
        debug!("downloaded {written} bytes from {url}");
        Ok(artifact)
    }
}

/// Parse `url`, requiring an absolute `http` or `https` URL.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] for unparsable or non-HTTP URLs.
pub fn parse_source_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme \"{other}\""),
        }),
    }
}

/// Stream `reader` into `writer`, reporting cumulative bytes.
fn copy_with_progress(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    total: Option<u64>,
    progress: &dyn ProgressReporter,
) -> std::io::Result<u64> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        writer.write_all(buffer.get(..read).unwrap_or_default())?;
        written += read as u64;
        progress.update(written, total);
    }
    if let Some(expected) = total.filter(|&expected| expected != written) {
        warn!("server declared {expected} bytes but sent {written}");
    }
    Ok(written)
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(status) => FetchError::Status {
            url: url.to_owned(),
            status,
        },
        ureq::Error::Io(source) => FetchError::Transport {
            url: url.to_owned(),
            reason: source.to_string(),
        },
        other => FetchError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
