//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Decide where the database and log files live.
//! - Provide the log level handed to [`crate::logging::init_logging`].
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolved paths are absolute, since logging rejects relative directories.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "SCORG_DB_PATH";
pub const LOG_DIR_ENV: &str = "SCORG_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "SCORG_LOG_LEVEL";

const APP_DIR_NAME: &str = "scorg";
const DB_FILE_NAME: &str = "scorg.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    CreateDir { path: PathBuf, source: std::io::Error },
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateDir { path, source } => {
                write!(f, "failed to create directory `{}`: {source}", path.display())
            }
            Self::CurrentDir(err) => write!(f, "failed to resolve current directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::CurrentDir(err) => Some(err),
        }
    }
}

/// Paths and log level for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorgConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl ScorgConfig {
    /// Resolves config from `SCORG_*` variables, falling back to the
    /// platform data directory (or the temp dir when there is none).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ScorgConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let app_dir = default_app_dir();
        let db_path = match read(DB_PATH_ENV) {
            Some(raw) => absolutize(PathBuf::from(raw))?,
            None => app_dir.join(DB_FILE_NAME),
        };
        let log_dir = match read(LOG_DIR_ENV) {
            Some(raw) => absolutize(PathBuf::from(raw))?,
            None => app_dir.join(LOG_DIR_NAME),
        };
        let log_level = read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string());

        Ok(Self {
            db_path,
            log_dir,
            log_level,
        })
    }

    /// Creates the database parent directory and the log directory.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.db_path.parent() {
            create_dir(parent)?;
        }
        create_dir(&self.log_dir)
    }

    /// Log directory as UTF-8, the shape `init_logging` accepts.
    pub fn log_dir_str(&self) -> String {
        self.log_dir.to_string_lossy().into_owned()
    }
}

fn default_app_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

fn absolutize(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(cwd.join(path))
}

fn create_dir(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|source| ConfigError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
