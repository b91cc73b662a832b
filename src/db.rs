use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::{AccountError, Result};

/// Shared handle to the SQLite connection
///
/// Cheap to clone; every clone points at the same connection. Callers never
/// touch the connection directly, they go through [`Database::with_transaction`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(Path::new(path))?
        };
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` (or a panic) the transaction is
    /// dropped, which rolls it back, and the lock is released either way.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| {
            warn!("database mutex poisoned");
            AccountError::Unavailable
        })?;

        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        debug!("transaction committed");

        Ok(value)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for file-backed databases; in-memory ones silently keep "memory"
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!(journal_mode = %mode, "journal mode set");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            date_joined TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
    Ok(count)
}
