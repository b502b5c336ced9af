pub mod catalog;
pub mod schema;
pub mod songs;
pub mod users;

#[cfg(test)]
pub mod test_support;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::database::schema::SCHEMA;
use crate::error::{AdminError, AdminResult};

/// Handle to the SQLite store. Holds no connection of its own: every
/// interaction opens a fresh one through [`Database::connect`] and drops it
/// when the interaction ends.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Points at an existing database file. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the database file if needed and applies the schema.
    pub fn create(path: impl Into<PathBuf>) -> AdminResult<Self> {
        let db = Self::new(path);
        let conn = db.open(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)?;
        conn.execute_batch(SCHEMA)?;
        info!("Schema ready at {:?}", db.path);
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a new connection with foreign keys enforced. A missing file is
    /// reported as `DatabaseUnavailable` rather than silently created.
    pub fn connect(&self) -> AdminResult<Connection> {
        self.open(OpenFlags::SQLITE_OPEN_READ_WRITE)
    }

    fn open(&self, flags: OpenFlags) -> AdminResult<Connection> {
        let conn = Connection::open_with_flags(&self.path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .map_err(|e| AdminError::DatabaseUnavailable(format!("{}: {}", self.path.display(), e)))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!("Opened connection to {:?}", self.path);
        Ok(conn)
    }
}
