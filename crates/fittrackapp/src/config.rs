//! # Configuration
//!
//! Configuration is managed by [`confique`], which handles layered loading
//! from TOML files and environment variables.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `FITTRACK_DATA_DIR`, `FITTRACK_DATABASE_URL`, etc.
//!    The legacy `DATABASE_URL` variable is honored when `FITTRACK_DATABASE_URL`
//!    is unset.
//! 2. **Data Directory Config**: `<data dir>/fittrack.toml`.
//! 3. **Global Config**: `fittrack.toml` in the OS-appropriate config directory
//!    (via `directories` crate).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! Command-line flags are applied on top by the caller.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | OS data dir | Where the JSON documents (and session file) live |
//! | `database_url` | unset | When set, the SQLite backend is used instead of JSON files |
//! | `cache_max_age_secs` | `300` | Maximum age of the file store's read cache |
//! | `query_limit` | `1000` | Cap on relational listings that ask for no limit |

use confique::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FitError, Result};

pub const CONFIG_FILE_NAME: &str = "fittrack.toml";

/// Configuration for fittrack, stored in `fittrack.toml`.
#[derive(Config, Debug, Clone, PartialEq, Eq)]
pub struct FitConfig {
    /// Directory holding activities.json, weight.json and settings.json.
    #[config(env = "FITTRACK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// `sqlite://<path>`, `sqlite::memory:` or a plain file path.
    #[config(env = "FITTRACK_DATABASE_URL")]
    pub database_url: Option<String>,

    #[config(default = 300, env = "FITTRACK_CACHE_MAX_AGE_SECS")]
    pub cache_max_age_secs: u64,

    #[config(default = 1000, env = "FITTRACK_QUERY_LIMIT")]
    pub query_limit: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database_url: None,
            cache_max_age_secs: 300,
            query_limit: 1000,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "fittrack", "fittrack")
}

/// The OS-appropriate data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| FitError::Config("could not determine a data directory".to_string()))
}

impl FitConfig {
    /// Load from the environment and config files.
    ///
    /// `data_dir` selects which directory's `fittrack.toml` is consulted; when
    /// `None` the environment or the OS default is used.
    pub fn load(data_dir: Option<&Path>) -> Result<Self> {
        let local_dir = match data_dir {
            Some(dir) => Some(dir.to_path_buf()),
            None => std::env::var_os("FITTRACK_DATA_DIR")
                .map(PathBuf::from)
                .or_else(|| project_dirs().map(|d| d.data_dir().to_path_buf())),
        };
        let global_dir = project_dirs().map(|d| d.config_dir().to_path_buf());

        let mut builder = FitConfig::builder().env();
        if let Some(dir) = &local_dir {
            builder = builder.file(dir.join(CONFIG_FILE_NAME));
        }
        if let Some(dir) = &global_dir {
            builder = builder.file(dir.join(CONFIG_FILE_NAME));
        }

        let mut config = builder
            .load()
            .map_err(|e| FitError::Config(e.to_string()))?;
        if config.database_url.is_none() {
            config.database_url = std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty());
        }
        Ok(config)
    }

    /// Load only `path`, ignoring the environment. Compiled defaults fill the
    /// gaps.
    pub fn from_file(path: &Path) -> Result<Self> {
        FitConfig::builder()
            .file(path)
            .load()
            .map_err(|e| FitError::Config(e.to_string()))
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    /// The configured data directory, or the OS default.
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    /// The relational backend is used whenever a database URL is configured.
    pub fn uses_database(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}
