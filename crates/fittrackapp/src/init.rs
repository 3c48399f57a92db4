//! # Backend Selection
//!
//! A running instance talks to exactly one backend, picked at startup:
//!
//! - **Relational**: a database URL is configured (flag, environment or config
//!   file). Data is multi-user; callers log in and work through
//!   [`SqlStore::for_user`].
//! - **File**: no database URL. Data is single-user JSON documents in the data
//!   directory.
//!
//! ## Resolution Flow
//!
//! [`initialize`] resolves, in order:
//! 1. The data directory: explicit override, else `data_dir` from the
//!    environment/config, else the OS data directory.
//! 2. The configuration, reading `fittrack.toml` from that data directory and
//!    the global config directory.
//! 3. The database URL: explicit override, else the configured one.
//!
//! The data directory is resolved even for the relational backend, since the
//! command-line client keeps its session file there.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::FitConfig;
use crate::db::SqlStore;
use crate::error::Result;
use crate::store::fs::FileStore;

pub enum Backend {
    File(FileStore),
    Relational(SqlStore),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::File(_) => "file",
            Backend::Relational(_) => "relational",
        }
    }
}

pub struct FitContext {
    pub backend: Backend,
    pub config: FitConfig,
    pub data_dir: PathBuf,
}

/// Open the backend `config` asks for.
pub fn open_backend(config: &FitConfig, data_dir: &Path) -> Result<Backend> {
    match config.database_url.as_deref().filter(|_| config.uses_database()) {
        Some(url) => {
            let store = SqlStore::open_url(url)?.with_query_limit(config.query_limit);
            Ok(Backend::Relational(store))
        }
        None => {
            let store = FileStore::open_with_max_age(data_dir, config.cache_max_age())?;
            Ok(Backend::File(store))
        }
    }
}

/// Load configuration and open the selected backend.
///
/// # Arguments
///
/// * `data_override` - Explicit data directory, bypassing configuration.
/// * `database_override` - Explicit database URL, selecting the relational
///   backend regardless of configuration.
pub fn initialize(
    data_override: Option<PathBuf>,
    database_override: Option<String>,
) -> Result<FitContext> {
    let mut config = FitConfig::load(data_override.as_deref())?;
    if let Some(dir) = data_override {
        config.data_dir = Some(dir);
    }
    if let Some(url) = database_override {
        config.database_url = Some(url);
    }

    let data_dir = config.resolved_data_dir()?;
    let backend = open_backend(&config, &data_dir)?;
    debug!(backend = backend.name(), data_dir = %data_dir.display(), "backend initialized");

    Ok(FitContext {
        backend,
        config,
        data_dir,
    })
}
