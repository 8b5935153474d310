//! Run configuration for ingestion jobs.
//!
//! # Responsibility
//! - Load settings from an optional TOML file plus environment overrides.
//! - Validate values before any file or database is touched.
//!
//! # Invariants
//! - Settings are immutable for the duration of one run.
//! - `max_batch_size` is always at least 1 after validation.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;
const DEFAULT_INPUT_DIR: &str = "data/input";
const DEFAULT_PROCESSED_DIR: &str = "data/processed";
const DEFAULT_DATABASE_PATH: &str = "data/staffload.db";

pub const ENV_CSV_DELIMITER: &str = "CSV_DELIMITER";
pub const ENV_MAX_BATCH_SIZE: &str = "MAX_BATCH_SIZE";
pub const ENV_CSV_INPUT_DIR: &str = "CSV_INPUT_DIR";
pub const ENV_CSV_PROCESSED_DIR: &str = "CSV_PROCESSED_DIR";
pub const ENV_DB_PATH: &str = "DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LOG_DIR";

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Batch size must be positive.
    InvalidBatchSize(usize),
    /// Delimiter must be exactly one ASCII character.
    InvalidDelimiter(String),
    /// A required path setting is empty.
    EmptyPath(&'static str),
    /// An environment override could not be interpreted.
    InvalidEnv {
        key: &'static str,
        value: String,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBatchSize(size) => {
                write!(f, "batch size must be greater than zero, got {size}")
            }
            Self::InvalidDelimiter(value) => write!(
                f,
                "csv delimiter must be a single ASCII character, got `{value}`"
            ),
            Self::EmptyPath(setting) => write!(f, "setting `{setting}` must not be empty"),
            Self::InvalidEnv { key, value } => {
                write!(f, "environment variable {key} has invalid value `{value}`")
            }
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid config file `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidBatchSize(_)
            | Self::InvalidDelimiter(_)
            | Self::EmptyPath(_)
            | Self::InvalidEnv { .. } => None,
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub csv_delimiter: char,
    pub max_batch_size: usize,
    pub input_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub database_path: PathBuf,
    /// Falls back to the build-mode default when unset.
    pub log_level: Option<String>,
    /// Logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            csv_delimiter: ',',
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            processed_dir: PathBuf::from(DEFAULT_PROCESSED_DIR),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: None,
            log_dir: None,
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or defaults), applies process
    /// environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_with(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses a TOML file; missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from a key lookup, typically the process
    /// environment.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CSV_DELIMITER) {
            self.csv_delimiter = parse_delimiter(&value)?;
        }
        if let Some(value) = lookup(ENV_MAX_BATCH_SIZE) {
            self.max_batch_size =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        key: ENV_MAX_BATCH_SIZE,
                        value: value.clone(),
                    })?;
        }
        if let Some(value) = lookup(ENV_CSV_INPUT_DIR) {
            self.input_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_CSV_PROCESSED_DIR) {
            self.processed_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_DB_PATH) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = Some(value);
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.max_batch_size));
        }
        self.delimiter_byte()?;
        for (name, path) in [
            ("input_dir", &self.input_dir),
            ("processed_dir", &self.processed_dir),
            ("database_path", &self.database_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyPath(name));
            }
        }
        Ok(())
    }

    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        if is_usable_delimiter(self.csv_delimiter) {
            Ok(self.csv_delimiter as u8)
        } else {
            Err(ConfigError::InvalidDelimiter(self.csv_delimiter.to_string()))
        }
    }

    /// Creates the inbound and processed directories when missing.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [&self.input_dir, &self.processed_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

fn parse_delimiter(value: &str) -> Result<char, ConfigError> {
    if value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if is_usable_delimiter(ch) => Ok(ch),
        _ => Err(ConfigError::InvalidDelimiter(value.to_string())),
    }
}

// Quote and line terminators are reserved by the CSV grammar.
fn is_usable_delimiter(ch: char) -> bool {
    ch.is_ascii() && !matches!(ch, '"' | '\n' | '\r')
}
