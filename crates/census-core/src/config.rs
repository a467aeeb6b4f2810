//! Endpoint and timeout configuration.
//!
//! The pipeline treats the endpoint URL as an opaque string; this module
//! only answers where it comes from. Resolution order: CLI argument →
//! environment variable → config file → unset (an error at the point of
//! use, not here — `show` and `status` work without a server).

use census_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable naming the collection endpoint.
pub const ENV_SERVER: &str = "CENSUS_SERVER";

/// Environment variable pointing at an alternate config file.
pub const ENV_CONFIG_PATH: &str = "CENSUS_CONFIG";

/// Config file name inside the XDG config directory.
const CONFIG_FILENAME: &str = "config.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "census";

/// Default request deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the server URL was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via CENSUS_SERVER.
    Environment,

    /// Found in the config file.
    ConfigFile,

    /// Not configured anywhere.
    #[default]
    Unset,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "config file"),
            ConfigSource::Unset => write!(f, "unset"),
        }
    }
}

/// On-disk configuration (`~/.config/census/config.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Collection endpoint URL.
    pub server_url: Option<String>,

    /// Request deadline in seconds.
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Parse a config file; a missing file is an empty config, a malformed
    /// one is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("malformed {}: {e}", path.display())))
    }
}

/// Resolved settings the CLI hands to the pipeline.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: Option<String>,
    pub server_source: ConfigSource,
    pub timeout: Duration,
}

impl Settings {
    /// The endpoint URL, or a configuration error telling the user how to
    /// set one.
    pub fn require_server_url(&self) -> Result<&str> {
        self.server_url.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "no server URL configured; pass --server, set {ENV_SERVER}, or add \
                 server_url to the config file"
            ))
        })
    }
}

/// Default config file location (`~/.config/census/config.toml`), honoring
/// the CENSUS_CONFIG override.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILENAME))
}

/// Resolve settings from CLI overrides, the environment, and the config file.
pub fn resolve(cli_server: Option<String>, cli_timeout_secs: Option<u64>) -> Result<Settings> {
    let file = match config_file_path() {
        Some(path) => ConfigFile::load(&path)?,
        None => ConfigFile::default(),
    };
    Ok(resolve_with(cli_server, cli_timeout_secs, std::env::var(ENV_SERVER).ok(), &file))
}

fn resolve_with(
    cli_server: Option<String>,
    cli_timeout_secs: Option<u64>,
    env_server: Option<String>,
    file: &ConfigFile,
) -> Settings {
    let (server_url, server_source) = if let Some(url) = cli_server {
        (Some(url), ConfigSource::CliArgument)
    } else if let Some(url) = env_server.filter(|url| !url.is_empty()) {
        (Some(url), ConfigSource::Environment)
    } else if let Some(url) = file.server_url.clone() {
        (Some(url), ConfigSource::ConfigFile)
    } else {
        (None, ConfigSource::Unset)
    };

    let timeout_secs = cli_timeout_secs
        .or(file.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Settings {
        server_url,
        server_source,
        timeout: Duration::from_secs(timeout_secs),
    }
}
