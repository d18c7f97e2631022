//! SQLite-backed local store for profiles, check-ins, the spoon ledger and the
//! activity catalog.
//!
//! The database lives at `~/.spoonkeeper/spoonkeeper.db` unless the config
//! overrides it. Every row is scoped by user id; nothing is shared across
//! users.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

pub mod accounts;
pub mod activities;
pub mod check_ins;
pub mod ledgers;
pub mod types;
pub use types::*;

pub struct TrackerDb {
    conn: Connection,
}

impl TrackerDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Open a database at an explicit path and apply the schema.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        log::debug!("Opened tracker database at {}", path.display());
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.spoonkeeper/spoonkeeper.db`.
    pub fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".spoonkeeper").join("spoonkeeper.db"))
    }

    /// Resolve the configured path, falling back to the default.
    pub fn resolve_path(configured: Option<&Path>) -> Result<PathBuf, DbError> {
        match configured {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::db_path(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_db() -> TrackerDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("spoonkeeper_test.db");
    std::mem::forget(dir);
    TrackerDb::open_at(path).expect("open test db")
}
