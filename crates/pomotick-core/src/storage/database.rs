//! SQLite-backed key-value storage.
//!
//! Persists the session log and timer state as JSON blobs in a single
//! `kv` table. Multi-key writes are atomic, and [`Database::exclusive`]
//! serializes read-modify-write cycles across processes.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection};

use super::data_dir;
use super::kv::KvStore;
use crate::error::{DatabaseError, Result};

/// How long a connection waits for another process's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database for timer persistence.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/pomotick/pomotick.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("pomotick.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.kv_set_many(&[(key, value)])
    }

    /// Set several values atomically.
    ///
    /// Uses a savepoint, so it nests inside [`Database::exclusive`].
    pub fn kv_set_many(&self, entries: &[(&str, &str)]) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch("SAVEPOINT kv_write")?;
        let written = entries.iter().try_for_each(|&(key, value)| {
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )
                .map(|_| ())
        });
        match written {
            Ok(()) => self.conn.execute_batch("RELEASE kv_write"),
            Err(e) => {
                let undo = "ROLLBACK TO kv_write; RELEASE kv_write";
                if let Err(rollback) = self.conn.execute_batch(undo) {
                    tracing::warn!(error = %rollback, "could not roll back kv write");
                }
                Err(e)
            }
        }
    }

    /// Run `f` holding the database write lock (`BEGIN IMMEDIATE`).
    ///
    /// Other processes block for up to the busy timeout, so their
    /// read-modify-write cycles cannot interleave with `f`'s. Writes made by
    /// `f` commit when it returns `Ok` and roll back when it returns `Err`.
    pub fn exclusive<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f() {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    tracing::warn!(error = %rollback, "could not roll back transaction");
                }
                Err(e)
            }
        }
    }
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        Ok(self.kv_set_many(entries)?)
    }
}
