//! Shared type definitions for the database layer.

use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Stored value is malformed: {0}")]
    Malformed(String),
}

/// A row from the `accounts` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbAccount {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password_salt: String,
    pub password_hash: String,
    pub created_at: String,
}
