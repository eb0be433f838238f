use rusqlite::Connection;
use tracing::info;

use crate::{DbError, Result};

/// Reference categories seeded by the initial migration.
pub const DEFAULT_CATEGORIES: &[&str] = &["bad", "average", "good", "great", "masterpiece"];

/// Latest schema version this build knows how to create.
pub const SCHEMA_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database is at schema v{version}, newest known is v{SCHEMA_VERSION}"
        )));
    }

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL
            );

            CREATE TABLE reviews (
                id              INTEGER PRIMARY KEY,
                movie_title     TEXT NOT NULL,
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                user_id         INTEGER NOT NULL REFERENCES users(id)
            );

            CREATE INDEX idx_reviews_user ON reviews(user_id);

            CREATE TABLE comments (
                id              INTEGER PRIMARY KEY,
                content         TEXT NOT NULL,
                rating          INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                created_at      TEXT NOT NULL,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                review_id       INTEGER NOT NULL REFERENCES reviews(id)
            );

            CREATE INDEX idx_comments_review ON comments(review_id, created_at);

            CREATE TABLE categories (
                id              INTEGER PRIMARY KEY,
                name            TEXT NOT NULL UNIQUE
            );

            CREATE TABLE review_categories (
                review_id       INTEGER NOT NULL REFERENCES reviews(id),
                category_id     INTEGER NOT NULL REFERENCES categories(id),
                PRIMARY KEY (review_id, category_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;

        let mut stmt = conn.prepare("INSERT OR IGNORE INTO categories (name) VALUES (?1)")?;
        for name in DEFAULT_CATEGORIES {
            stmt.execute([name])?;
        }
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::{Database, DbError};

    #[test]
    fn reopening_keeps_a_single_seed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("critic.db");
        Database::open(&path).unwrap();
        let db = Database::open(&path).unwrap();

        let conn = db.connect().unwrap();
        assert_eq!(conn.get_categories().unwrap().len(), super::DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("critic.db");
        let db = Database::open(&path).unwrap();
        db.connect()
            .unwrap()
            .execute("INSERT INTO schema_version (version) VALUES (?1)", [super::SCHEMA_VERSION + 1])
            .unwrap();

        assert!(matches!(Database::open(&path), Err(DbError::Migration(_))));
    }
}
