//! SQLite database module for multi-user storage
//!
//! The relational backend. Unlike the file store it knows about users: every
//! activity and weight entry row carries a `user_id`, and every read and write
//! is filtered by it.
//!
//! ## Tables
//!
//! - `users` - Accounts, preferences and the optional remember token
//! - `activities` - Workouts, owned by a user
//! - `weight_entries` - Weigh-ins, owned by a user
//! - `friendships` - Symmetric join table (both directions are stored)
//!
//! ## Units of Work
//!
//! Each public operation takes the connection lock, runs inside its own
//! transaction and releases both before returning. A closure that returns
//! `Err` rolls the transaction back, so a failed operation leaves no partial
//! rows behind.
//!
//! ## Per-User View
//!
//! [`SqlStore::for_user`] returns a [`UserStore`], which implements the same
//! [`crate::store::ActivityStore`] and [`crate::store::WeightStore`] traits as
//! the file store, with integer ids.

pub mod activities;
pub mod friends;
pub mod schema;
pub mod users;
pub mod weights;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{FitError, Result};

/// Default cap on listings that did not ask for a limit.
pub const DEFAULT_QUERY_LIMIT: usize = 1000;

/// SQLite database for users and their data
pub struct SqlStore {
    conn: Mutex<Connection>,
    query_limit: usize,
}

impl SqlStore {
    /// Open or create the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening SQLite database at {:?}", path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // WAL for concurrent readers from other processes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory SQLite database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open from a database URL: `sqlite://<path>`, `sqlite::memory:` or a
    /// plain path.
    pub fn open_url(url: &str) -> Result<Self> {
        match DatabaseUrl::parse(url)? {
            DatabaseUrl::Memory => Self::open_in_memory(),
            DatabaseUrl::File(path) => Self::open(&path),
        }
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            query_limit: DEFAULT_QUERY_LIMIT,
        })
    }

    pub fn with_query_limit(mut self, limit: usize) -> Self {
        self.query_limit = limit.max(1);
        self
    }

    pub fn query_limit(&self) -> usize {
        self.query_limit
    }

    /// A view scoped to one user's activities and weight entries.
    pub fn for_user(&self, user_id: i64) -> UserStore<'_> {
        UserStore {
            db: self,
            user_id,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FitError::Store(format!("Lock poisoned: {}", e)))
    }

    /// Run a read against the connection.
    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`.
    pub(crate) fn unit_of_work<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, "rolling back");
                // Dropping the transaction rolls it back.
                drop(tx);
                Err(e)
            }
        }
    }

    /// Row counts, for diagnostics.
    pub fn stats(&self) -> Result<DbStats> {
        self.with_conn(|conn| {
            let count = |table: &str| -> Result<u64> {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })?;
                Ok(n as u64)
            };
            Ok(DbStats {
                user_count: count("users")?,
                activity_count: count("activities")?,
                weight_entry_count: count("weight_entries")?,
                // Each friendship is stored once per direction.
                friendship_count: count("friendships")? / 2,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub user_count: u64,
    pub activity_count: u64,
    pub weight_entry_count: u64,
    pub friendship_count: u64,
}

/// Where the relational store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    Memory,
    File(PathBuf),
}

impl DatabaseUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FitError::Config("empty database URL".to_string()));
        }
        if url == "sqlite::memory:" || url == ":memory:" || url == "sqlite://:memory:" {
            return Ok(DatabaseUrl::Memory);
        }
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Err(FitError::Config(format!(
                "unsupported database URL (only SQLite is available): {}",
                url
            )));
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.contains("://") {
            return Err(FitError::Config(format!("unsupported database URL: {}", url)));
        }
        Ok(DatabaseUrl::File(PathBuf::from(path)))
    }
}

/// One user's slice of the database.
///
/// Implements [`crate::store::ActivityStore`] (see [`activities`]) and
/// [`crate::store::WeightStore`] (see [`weights`]).
pub struct UserStore<'a> {
    db: &'a SqlStore,
    user_id: i64,
}

impl<'a> UserStore<'a> {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn db(&self) -> &'a SqlStore {
        self.db
    }
}

/// Fails with `UserNotFound` unless `user_id` names an account.
pub(crate) fn ensure_user(conn: &Connection, user_id: i64) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [user_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(FitError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_database_urls() {
        assert_eq!(
            DatabaseUrl::parse("sqlite::memory:").unwrap(),
            DatabaseUrl::Memory
        );
        assert_eq!(
            DatabaseUrl::parse("sqlite:///tmp/fit.db").unwrap(),
            DatabaseUrl::File(PathBuf::from("/tmp/fit.db"))
        );
        assert_eq!(
            DatabaseUrl::parse("sqlite://fit.db").unwrap(),
            DatabaseUrl::File(PathBuf::from("fit.db"))
        );
        assert_eq!(
            DatabaseUrl::parse("data/fit.db").unwrap(),
            DatabaseUrl::File(PathBuf::from("data/fit.db"))
        );
        assert!(matches!(
            DatabaseUrl::parse("postgresql://u@h/db"),
            Err(FitError::Config(_))
        ));
        assert!(DatabaseUrl::parse("mysql://h/db").is_err());
        assert!(DatabaseUrl::parse("  ").is_err());
    }

    #[test]
    fn open_file_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fit.db");
        let store = SqlStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.stats().unwrap().user_count, 0);
    }

    #[test]
    fn reopening_keeps_schema_and_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.db");
        {
            let store = SqlStore::open(&path).unwrap();
            store.create_user("alice", "a@x.com", "secret1").unwrap();
        }
        let store = SqlStore::open_url(&format!("sqlite://{}", path.display())).unwrap();
        assert_eq!(store.stats().unwrap().user_count, 1);
    }

    #[test]
    fn unit_of_work_rolls_back_on_error() {
        let store = SqlStore::open_in_memory().unwrap();
        let result: Result<()> = store.unit_of_work(|tx| {
            tx.execute(
                "INSERT INTO users (username, email, password_hash, created_at)
                 VALUES ('ghost', 'g@x.com', 'h', '2024-01-01 00:00:00')",
                [],
            )?;
            Err(FitError::Store("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.stats().unwrap().user_count, 0);
    }

    #[test]
    fn query_limit_is_at_least_one() {
        let store = SqlStore::open_in_memory().unwrap().with_query_limit(0);
        assert_eq!(store.query_limit(), 1);
    }
}
