pub mod comments;
pub mod error;
pub mod migrations;
pub mod models;
pub mod reviews;
pub mod users;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Params, Row};
use tracing::{debug, info};

pub use error::{DbError, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the SQLite database. Holds no open connection; each request
/// gets its own through [`Database::connect`].
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Create or migrate the database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode so readers don't block the writer
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Open a connection for a single request. It is closed when the
    /// returned [`Conn`] is dropped.
    pub fn connect(&self) -> Result<Conn> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        debug!("Opened request connection to {}", self.path.display());
        Ok(Conn { conn })
    }
}

/// Request-scoped connection handle.
pub struct Conn {
    conn: Connection,
}

impl Conn {
    pub fn query_rows<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn query_opt<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let row = self.conn.query_row(sql, params, map).optional()?;
        Ok(row)
    }

    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Run an INSERT and return the new rowid.
    pub fn insert<P: Params>(&self, sql: &str, params: P) -> Result<i64> {
        self.conn.execute(sql, params)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Run `f` inside a transaction. Rolled back if `f` fails.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        debug!("Closing request connection");
    }
}
