//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error; the service starts on defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "FOODGRAM_ROOT_FOLDER";
/// Environment variable overriding the database path
pub const DATABASE_ENV: &str = "FOODGRAM_DATABASE";
/// Environment variable overriding the bind host
pub const HOST_ENV: &str = "FOODGRAM_HOST";
/// Environment variable overriding the HTTP port
pub const PORT_ENV: &str = "FOODGRAM_PORT";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;
/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "foodgram.db";

/// Bootstrap configuration loaded from a TOML file
///
/// All fields are optional; anything left out falls through to the
/// compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit SQLite database path, overrides `<root_folder>/foodgram.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Bind host
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP port
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML configuration text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load the configuration file if one is available
    ///
    /// An explicitly requested file must exist and parse. Without one, the
    /// per-user default location is tried and a missing file yields defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match Self::locate(explicit) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// The file `load_or_default` reads: the explicit path, else the
    /// per-user default when it exists
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.exists()),
        }
    }
}

/// Per-user configuration file location (`~/.config/foodgram/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("foodgram").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("foodgram"))
        .unwrap_or_else(|| PathBuf::from("./foodgram_data"))
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve every setting: CLI, then environment, then TOML, then defaults
    pub fn resolve(cli: &ConfigOverrides, toml: &TomlConfig) -> Result<Self> {
        let root_folder = cli
            .root_folder
            .clone()
            .or_else(|| env_var(ROOT_FOLDER_ENV).map(PathBuf::from))
            .or_else(|| toml.root_folder.clone())
            .unwrap_or_else(default_root_folder);

        let database_path = cli
            .database_path
            .clone()
            .or_else(|| env_var(DATABASE_ENV).map(PathBuf::from))
            .or_else(|| toml.database_path.clone())
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE_NAME));

        let host = cli
            .host
            .clone()
            .or_else(|| env_var(HOST_ENV))
            .or_else(|| toml.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match cli.port {
            Some(port) => port,
            None => match env_var(PORT_ENV) {
                Some(raw) => raw.parse::<u16>().map_err(|e| {
                    Error::Config(format!("{} must be a port number: {}", PORT_ENV, e))
                })?,
                None => toml.port.unwrap_or(DEFAULT_PORT),
            },
        };

        Ok(Self {
            root_folder,
            database_path,
            host,
            port,
            log_level: toml.logging.level.clone(),
        })
    }

    /// `host:port` string for binding the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create the root folder if it does not exist yet
    pub fn ensure_root_folder(&self) -> Result<()> {
        if !self.root_folder.exists() {
            warn!(
                "Root folder {} does not exist, creating it",
                self.root_folder.display()
            );
            std::fs::create_dir_all(&self.root_folder)?;
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
