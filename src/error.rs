use std::path::PathBuf;
use thiserror::Error;

/// Main error type for bible-db
#[derive(Error, Debug)]
pub enum BibleDbError {
    /// Database-related errors (schema, inserts, optimization)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A store is missing objects the schema defines
    #[error("Schema error: {0}")]
    Schema(String),

    /// A source file could not be turned into book records
    #[error("Decode error: {0}")]
    Decode(String),

    /// A transient file survived every removal attempt
    #[error("Failed to remove {} after {attempts} attempts: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// Compressed artifact does not match the store it was built from
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using BibleDbError
pub type Result<T> = std::result::Result<T, BibleDbError>;
