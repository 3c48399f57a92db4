//! The login session of the SQLite backend, kept as `session.json` in the data
//! directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub token: String,
}

fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SESSION_FILE)
}

/// The stored session, if any. An unreadable file counts as logged out.
pub fn load(data_dir: &Path) -> Option<Session> {
    let raw = fs::read_to_string(session_path(data_dir)).ok()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable session file");
            None
        }
    }
}

pub fn save(data_dir: &Path, session: &Session) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    let path = session_path(data_dir);
    let json = serde_json::to_string_pretty(session)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Removes the session file. Returns whether there was one.
pub fn clear(data_dir: &Path) -> Result<bool> {
    let path = session_path(data_dir);
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}
