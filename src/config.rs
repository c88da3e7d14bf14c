//! Layered application configuration.
//!
//! Settings are merged in increasing order of precedence:
//!
//! 1. Built-in defaults
//! 2. `config.toml` (from `--config` or the platform config directory)
//! 3. `DUPCULL_*` environment variables (`__` separates nested keys)
//! 4. Command-line flags
//!
//! ```toml
//! sample_size = 65536
//! chunk_size = 1048576
//! max_workers = 8
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::duplicates::stage::{
    default_max_workers, WorkerTiers, DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_LARGE_FILE_WORKERS,
    DEFAULT_MEDIUM_FILE_WORKERS, DEFAULT_QUEUE_DEPTH, DEFAULT_SMALL_FILE_THRESHOLD,
    DEFAULT_SMALL_FILE_WORKERS,
};
use crate::duplicates::FinderConfig;
use crate::scanner::sampler::{DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_SIZE};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPCULL_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A layer could not be parsed or had the wrong types.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// The effective configuration could not be rendered.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bytes compared by the prefix and suffix stages
    pub sample_size: u64,
    /// Read buffer for full hashing
    pub chunk_size: usize,
    /// Files up to this size use `small_file_workers`
    pub small_file_threshold: u64,
    /// Files from this size on use `large_file_workers`
    pub large_file_threshold: u64,
    /// Concurrent readers for small files
    pub small_file_workers: usize,
    /// Concurrent readers for medium files
    pub medium_file_workers: usize,
    /// Concurrent readers for large files
    pub large_file_workers: usize,
    /// Cap on concurrent readers; derived from the CPU count when unset
    pub max_workers: Option<usize>,
    /// Jobs queued per worker
    pub queue_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            small_file_threshold: DEFAULT_SMALL_FILE_THRESHOLD,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            small_file_workers: DEFAULT_SMALL_FILE_WORKERS,
            medium_file_workers: DEFAULT_MEDIUM_FILE_WORKERS,
            large_file_workers: DEFAULT_LARGE_FILE_WORKERS,
            max_workers: None,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl Config {
    /// Default config file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupcull", "dupcull")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Defaults, then the TOML file at `path` (if any), then environment.
    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from an explicit file (or none) plus the environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if any layer is malformed.
    pub fn load_from_path(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    /// Load every layer, including the command line.
    ///
    /// A file named with `--config` must exist; the default file is
    /// optional.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] for a missing `--config` file, or
    /// [`ConfigError::Invalid`] if any layer is malformed.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let path = match cli.config {
            Some(ref explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound(explicit.clone()));
                }
                Some(explicit.clone())
            }
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(ref p) = path {
            log::debug!("Loading config from {}", p.display());
        }

        let mut config = Self::load_from_path(path.as_deref())?;
        config.apply_cli(cli);
        Ok(config)
    }

    /// Overlay command-line flags.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(sample_size) = cli.sample_size {
            self.sample_size = sample_size;
        }
        if let Some(max_workers) = cli.max_workers {
            self.max_workers = Some(max_workers);
        }
    }

    /// Render as TOML, in the format [`load`](Self::load) reads back.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] if rendering fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Build the pipeline configuration.
    #[must_use]
    pub fn to_finder_config(&self) -> FinderConfig {
        FinderConfig {
            sample_size: self.sample_size,
            chunk_size: self.chunk_size,
            tiers: WorkerTiers {
                small_threshold: self.small_file_threshold,
                large_threshold: self.large_file_threshold,
                small_workers: self.small_file_workers,
                medium_workers: self.medium_file_workers,
                large_workers: self.large_file_workers,
                max_workers: self.max_workers.unwrap_or_else(default_max_workers),
            },
            queue_depth: self.queue_depth,
            ..FinderConfig::default()
        }
    }
}
