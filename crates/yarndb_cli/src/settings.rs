//! Settings file layered under command-line flags.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File read from the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "yarndb.yaml";

/// Errors reading the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("cannot read settings file {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid settings YAML.
    #[error("invalid settings file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },
}

/// Effective CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the shard files.
    pub data_dir: PathBuf,
    /// Background save period in seconds; 0 disables it.
    pub auto_save_interval: u64,
    /// Log filter directive (`debug`, `info`, `warn`, `error`, or a full
    /// `EnvFilter` expression).
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            auto_save_interval: 60,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line; each one overrides the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub auto_save_interval: Option<u64>,
    pub log_level: Option<String>,
}

impl Settings {
    /// Loads settings from `explicit`, or from [`DEFAULT_SETTINGS_FILE`] if it
    /// exists, then applies `overrides`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<Self, SettingsError> {
        let mut settings = match explicit {
            Some(path) => Self::read(path)?,
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::read(path)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply(overrides);
        Ok(settings)
    }

    fn read(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(secs) = overrides.auto_save_interval {
            self.auto_save_interval = secs;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
    }

    /// The background save period.
    pub fn auto_save(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval)
    }
}
