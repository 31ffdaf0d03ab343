use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tokio::task;
use crate::error::{Result, BibleDbError};

pub mod optimize;
pub mod schema;

/// How a phase is allowed to touch the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Bulk loading into the working store
    Ingest,
    /// Compaction and statistics refresh; leaves the journal mode to the caller
    Maintenance,
    /// Reporting and search against a finished store
    ReadOnly,
}

/// Database connection manager
///
/// Every call to [`Db::open_connection`] or [`Db::with_connection`] opens a
/// fresh connection that is closed when it goes out of scope, so one phase
/// never holds a handle into the next.
#[derive(Debug, Clone)]
pub struct Db {
    path: PathBuf,
    mode: AccessMode,
}

impl Db {
    /// Connection manager for loading a working store
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self::with_mode(db_path, AccessMode::Ingest)
    }

    /// Connection manager for the optimizer
    pub fn maintenance<P: AsRef<Path>>(db_path: P) -> Self {
        Self::with_mode(db_path, AccessMode::Maintenance)
    }

    /// Connection manager for reporting against a finished store
    pub fn read_only<P: AsRef<Path>>(db_path: P) -> Self {
        Self::with_mode(db_path, AccessMode::ReadOnly)
    }

    fn with_mode<P: AsRef<Path>>(db_path: P, mode: AccessMode) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new database connection with the pragmas for this access mode
    pub fn open_connection(&self) -> Result<Connection> {
        match self.mode {
            AccessMode::Ingest => {
                let conn = Connection::open(&self.path).map_err(BibleDbError::Database)?;

                // WAL + NORMAL sync for bulk load speed, foreign keys for integrity,
                // temp_store = MEMORY and a 64MB page cache for the search index build
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL; \
                     PRAGMA synchronous = NORMAL; \
                     PRAGMA foreign_keys = ON; \
                     PRAGMA temp_store = MEMORY; \
                     PRAGMA cache_size = -65536;",
                )?;
                Ok(conn)
            }
            AccessMode::Maintenance => {
                let conn = Connection::open_with_flags(
                    &self.path,
                    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(BibleDbError::Database)?;
                conn.execute_batch("PRAGMA temp_store = MEMORY;")?;
                Ok(conn)
            }
            AccessMode::ReadOnly => {
                let conn = Connection::open_with_flags(
                    &self.path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(BibleDbError::Database)?;
                Ok(conn)
            }
        }
    }

    /// Execute a closure with a database connection in a blocking task
    ///
    /// The connection is dropped (and therefore closed) before this returns.
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        task::spawn_blocking(move || {
            let mut conn = db.open_connection()?;
            let result = f(&mut conn);
            if let Err((_conn, e)) = conn.close() {
                log::warn!("Failed to close connection to {}: {}", db.path.display(), e);
                return Err(BibleDbError::Database(e));
            }
            result
        })
        .await
        .map_err(|e| {
            BibleDbError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("database task failed: {}", e),
            ))
        })?
    }
}
