use rusqlite::ffi;

/// Errors raised by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The `users.username` UNIQUE constraint rejected an insert.
    #[error("username is already taken")]
    UsernameTaken,

    /// The file's schema can't be brought to the version this build expects.
    #[error("migration failed: {0}")]
    Migration(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    pub(crate) fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
