//! Core runtime configuration.
//!
//! # Responsibility
//! - Resolve database path, log directory, log level and default theme.
//! - Layer sources as: `CALNOTE_*` environment, then the JSON file named by
//!   `CALNOTE_CONFIG`, then platform defaults.
//!
//! # Invariants
//! - Resolution never panics; unset sources fall back to defaults.
//! - A config file that is named but unreadable is an error, not a fallback.
//! - Blank environment values are ignored.

use crate::logging::default_log_level;
use crate::model::theme::DEFAULT_THEME;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON config file.
pub const ENV_CONFIG_PATH: &str = "CALNOTE_CONFIG";
/// Environment variable overriding the SQLite database path.
pub const ENV_DB_PATH: &str = "CALNOTE_DB_PATH";
/// Environment variable overriding the log directory.
pub const ENV_LOG_DIR: &str = "CALNOTE_LOG_DIR";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "CALNOTE_LOG_LEVEL";

const DB_FILE_NAME: &str = "calnote.sqlite3";
const LOG_DIR_NAME: &str = "logs";

/// Resolved configuration for one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite database holding the key-value store.
    pub db_path: PathBuf,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Theme applied when no theme has been persisted yet.
    pub default_theme: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
            default_theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from defaults and process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Resolves configuration for an entry point: the file named by
    /// `CALNOTE_CONFIG` when set, then environment overrides.
    ///
    /// # Errors
    /// - The named file cannot be read.
    /// - The file is not valid JSON for this shape.
    pub fn resolve() -> Result<Self, ConfigError> {
        Self::resolve_with(|name| std::env::var(name).ok())
    }

    /// [`CoreConfig::resolve`] over an arbitrary variable lookup.
    pub fn resolve_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup(ENV_CONFIG_PATH)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let base = match path {
            Some(path) => Self::from_json_file(Path::new(path.as_str()))?,
            None => Self::default(),
        };
        Ok(base.with_overrides(lookup))
    }

    /// Reads a JSON config file. Missing fields take default values.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        serde_json::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            source: err,
        })
    }

    /// Applies `CALNOTE_*` overrides from the given lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_DB_PATH) {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        self
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "calnote", "calnote")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("calnote"))
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}
