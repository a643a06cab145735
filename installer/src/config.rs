//! Optional TOML configuration file.
//!
//! Settings are read from `recipe-installer.toml` in the working directory, or
//! from the file named by `--config`. Every field has a default, so a missing
//! file is equivalent to an empty one. Command-line flags override file values
//! (see [`crate::cli::Cli::resolve`]).

use crate::error::{InstallerError, Result};
use crate::registrar::DEFAULT_PROGRAM;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "recipe-installer.toml";
/// Default recipes root.
pub const DEFAULT_RECIPES_DIR: &str = "external_recipes";
/// Default descriptor file name.
pub const DEFAULT_DESCRIPTOR_FILE: &str = "conandata.yml";
/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// File-level settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct InstallerConfig {
    /// Root holding one directory per package.
    pub recipes_dir: Utf8PathBuf,
    /// Descriptor file name inside each package directory.
    pub descriptor_file: String,
    /// Registrar program.
    pub conan: String,
    /// Whether to draw download progress bars.
    pub progress: bool,
    /// Whether to skip the registrar pre-flight check.
    pub skip_tool_check: bool,
    /// Seconds allowed to establish a connection.
    pub connect_timeout_secs: u64,
    /// Upper bound in seconds on a whole request; unset waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            recipes_dir: Utf8PathBuf::from(DEFAULT_RECIPES_DIR),
            descriptor_file: DEFAULT_DESCRIPTOR_FILE.to_owned(),
            conan: DEFAULT_PROGRAM.to_owned(),
            progress: true,
            skip_tool_check: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            timeout_secs: None,
        }
    }
}

impl InstallerConfig {
    /// Load configuration from `explicit`, or from [`DEFAULT_CONFIG_FILE`] in
    /// the working directory when present.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ConfigFile`] when an explicit file is missing
    /// or when a file exists but cannot be read or parsed.
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Utf8Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load_from(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ConfigFile`] when the file cannot be read or
    /// parsed.
    pub fn load_from(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| InstallerError::ConfigFile {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        Self::parse(&text).map_err(|reason| InstallerError::ConfigFile {
            path: path.to_owned(),
            reason,
        })
    }

    /// Parse configuration text.
    ///
    /// # Errors
    ///
    /// Returns the parser's message for malformed TOML or unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use recipe_installer::config::InstallerConfig;
    ///
    /// let config = InstallerConfig::parse("conan = \"conan2\"\nprogress = false\n").unwrap();
    /// assert_eq!(config.conan, "conan2");
    /// assert!(!config.progress);
    /// assert_eq!(config.descriptor_file, "conandata.yml");
    /// ```
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}
