use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LadError, Result};

mod schema;
mod sheets;

pub use schema::SCHEMA_VERSION;

/// Busy timeout used outside of the advisory lock
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A workbook persisted in a single SQLite file
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the workbook at `path`, creating it if needed, running migrations
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open in-memory workbook for testing
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// `<config dir>/ladcmd/workbook.db`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            LadError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not find config directory",
            ))
        })?;
        Ok(config_dir.join("ladcmd").join("workbook.db"))
    }

    /// Run `f` while holding the workbook's single advisory write lock.
    ///
    /// Waits at most `timeout` for another writer to finish and fails with
    /// [`LadError::Busy`] otherwise. Writes made by `f` commit together when
    /// it succeeds and roll back when it fails.
    pub fn with_lock<T>(&self, timeout: Duration, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.conn.busy_timeout(timeout)?;
        let begin = self.conn.execute_batch("BEGIN IMMEDIATE");
        self.conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;

        match begin {
            Ok(()) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                log::warn!("workbook lock not acquired within {:?}", timeout);
                return Err(LadError::Busy);
            }
            Err(e) => return Err(e.into()),
        }

        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    log::error!("rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    /// Run several statements as one unit, nesting inside an outer lock if held
    fn atomically<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.conn.execute_batch("SAVEPOINT lad_write")?;
        match f() {
            Ok(value) => {
                self.conn.execute_batch("RELEASE lad_write")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO lad_write; RELEASE lad_write")
                {
                    log::error!("savepoint rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    fn migrate(&self) -> Result<()> {
        let version = self.get_schema_version()?;

        if version == 0 {
            // Run migration in a transaction for atomicity
            self.conn
                .execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", schema::SCHEMA_V1))?;
            self.set_schema_version(1)?;
        }

        if version < 2 {
            self.conn.execute_batch(schema::MIGRATION_V2)?;
            self.set_schema_version(2)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32> {
        let result: rusqlite::Result<i32> =
            self.conn
                .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                    row.get(0)
                });

        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(rusqlite::Error::SqliteFailure(err, msg)) => {
                // "no such table" is reported as a generic SQLITE_ERROR
                if err.code == ErrorCode::Unknown
                    && msg.as_ref().map_or(false, |m| m.contains("no such table"))
                {
                    Ok(0)
                } else {
                    Err(rusqlite::Error::SqliteFailure(err, msg).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
            [version],
        )?;
        Ok(())
    }
}
