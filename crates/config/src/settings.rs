// Run settings
// Layered: defaults, then ttrack.toml (or --config), then TRAINING_TRACKER_* env vars.
// CLI flags are applied on top by the caller.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "ttrack.toml";

pub const ENV_INPUT_DIR: &str = "TRAINING_TRACKER_INPUT_DIR";
pub const ENV_OUTPUT_DIR: &str = "TRAINING_TRACKER_OUTPUT_DIR";
pub const ENV_ALLOWED_STATUS: &str = "TRAINING_TRACKER_ALLOWED_STATUS";
pub const ENV_YEAR: &str = "TRAINING_TRACKER_YEAR";

const DEFAULT_ALLOWED_STATUS: &str = "COMPLETED;IN PROGRESS;NOT STARTED;OVERDUE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root holding `hr/` and `organizations/`.
    pub input_dir: PathBuf,

    /// Where the workbook and issue CSV are written.
    pub output_dir: PathBuf,

    /// Status values the training system is known to emit. Reported only.
    pub allowed_completion_status: Vec<String>,

    /// Reporting year. Reported only.
    pub reference_year: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./training_tracker/input"),
            output_dir: PathBuf::from("./training_tracker/output"),
            allowed_completion_status: split_status(DEFAULT_ALLOWED_STATUS),
            reference_year: current_year(),
        }
    }
}

impl Settings {
    /// Resolve settings from file and environment.
    ///
    /// An explicit `config` path must exist and parse. Without one,
    /// `ttrack.toml` in the working directory is used when present; if it
    /// fails to parse, a warning is logged and defaults are used.
    pub fn load(config: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match config {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = PathBuf::from(CONFIG_FILE_NAME);
                if path.is_file() {
                    Self::from_file(&path).unwrap_or_else(|e| {
                        warn!("{e}; using defaults");
                        Self::default()
                    })
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env();
        debug!(?settings, "settings resolved");
        Ok(settings)
    }

    /// Parse a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `TRAINING_TRACKER_*` overrides read through `lookup`.
    /// Empty values are ignored; an unparseable year falls back to the current year.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_INPUT_DIR) {
            self.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(list) = get(ENV_ALLOWED_STATUS) {
            self.allowed_completion_status = split_status(&list);
        }
        if let Some(year) = get(ENV_YEAR) {
            self.reference_year = year.trim().parse().unwrap_or_else(|_| {
                warn!(value = %year, "{ENV_YEAR} is not a year; using the current year");
                current_year()
            });
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, input_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = input_dir {
            self.input_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self
    }
}

fn split_status(list: &str) -> Vec<String> {
    list.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}
