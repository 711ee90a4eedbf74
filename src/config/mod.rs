//! Configuration for `tracker_metrics`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI `--data-dir` override
//! 2. `TRACKER_METRICS_DIR` environment variable
//! 3. Default (`./tracker-data`)
//!
//! An optional `config.yaml` inside the data directory can relocate the
//! fetch cache, the database file, and the git repositories root.
//! Relative paths in the file resolve against the data directory.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Environment variable naming the data directory.
const ENV_DATA_DIR: &str = "TRACKER_METRICS_DIR";
/// Default data directory, relative to the working directory.
const DEFAULT_DATA_DIR: &str = "tracker-data";
/// Optional per-data-dir configuration file.
const CONFIG_FILENAME: &str = "config.yaml";
/// Default database filename inside the data directory.
const DEFAULT_DB_FILENAME: &str = "issue_data.sqlite";

/// Optional overrides read from `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub db_file: Option<PathBuf>,
    #[serde(default)]
    pub repos_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Load `config.yaml` from the data directory.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Resolved paths for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub db_path: PathBuf,
    pub repos_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory and derived paths.
    ///
    /// # Errors
    ///
    /// Returns an error if `config.yaml` exists but cannot be parsed.
    pub fn resolve(data_dir_override: Option<&Path>) -> Result<Self> {
        let env_value = env::var(ENV_DATA_DIR).ok();
        Self::resolve_with_env(data_dir_override, env_value.as_deref())
    }

    fn resolve_with_env(data_dir_override: Option<&Path>, env_value: Option<&str>) -> Result<Self> {
        let data_dir = data_dir_override.map_or_else(
            || match env_value {
                Some(value) if !value.trim().is_empty() => PathBuf::from(value),
                _ => PathBuf::from(DEFAULT_DATA_DIR),
            },
            Path::to_path_buf,
        );

        let file = FileConfig::load(&data_dir)?;
        let cache_dir = file
            .cache_dir
            .map_or_else(|| data_dir.join("cache"), |p| join_rel(&data_dir, p));
        let db_path = file.db_file.map_or_else(
            || data_dir.join(DEFAULT_DB_FILENAME),
            |p| join_rel(&data_dir, p),
        );
        let repos_dir = file
            .repos_dir
            .map_or_else(|| data_dir.join("repos"), |p| join_rel(&data_dir, p));

        Ok(Self {
            data_dir,
            cache_dir,
            db_path,
            repos_dir,
        })
    }

    /// Directory holding completed fetch results.
    #[must_use]
    pub fn cache_full_dir(&self) -> PathBuf {
        self.cache_dir.join("full")
    }

    /// Directory holding resumable partial fetch results.
    #[must_use]
    pub fn cache_partial_dir(&self) -> PathBuf {
        self.cache_dir.join("partial")
    }

    /// Path to a project's local git clone.
    #[must_use]
    pub fn repo_path(&self, dir_name: &str) -> PathBuf {
        self.repos_dir.join(dir_name)
    }
}

fn join_rel(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
