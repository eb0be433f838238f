use crate::models::{User, UserCredentials, UserReview, UserStats};
use crate::{Conn, DbError, Result};

impl Conn {
    /// Insert a user. A duplicate username maps to [`DbError::UsernameTaken`].
    pub fn insert_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.insert(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            (username, password_hash),
        )
        .map_err(|e| if e.is_unique_violation() { DbError::UsernameTaken } else { e })
    }

    pub fn get_user_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        self.query_opt(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(UserCredentials {
                    id: row.get(0)?,
                    password_hash: row.get(1)?,
                })
            },
        )
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.query_opt("SELECT id, username FROM users WHERE id = ?1", [id], |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
            })
        })
    }

    /// Review count plus first/last review timestamps.
    pub fn get_user_stats(&self, id: i64) -> Result<UserStats> {
        let stats = self.query_opt(
            "SELECT COUNT(*), MIN(created_at), MAX(created_at)
             FROM reviews
             WHERE user_id = ?1",
            [id],
            |row| {
                Ok(UserStats {
                    count: row.get(0)?,
                    first_review: row.get(1)?,
                    last_review: row.get(2)?,
                })
            },
        )?;

        // An aggregate without GROUP BY always yields one row
        Ok(stats.unwrap_or(UserStats {
            count: 0,
            first_review: None,
            last_review: None,
        }))
    }

    pub fn get_user_reviews(&self, id: i64) -> Result<Vec<UserReview>> {
        self.query_rows(
            "SELECT r.id, r.movie_title, r.created_at,
                    COUNT(c.id), ROUND(AVG(c.rating), 1)
             FROM reviews r
             LEFT JOIN comments c ON c.review_id = r.id
             WHERE r.user_id = ?1
             GROUP BY r.id
             ORDER BY r.created_at DESC, r.id DESC",
            [id],
            |row| {
                Ok(UserReview {
                    id: row.get(0)?,
                    movie_title: row.get(1)?,
                    created_at: row.get(2)?,
                    comment_count: row.get(3)?,
                    avg_rating: row.get(4)?,
                })
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{setup, user};
    use crate::DbError;

    #[test]
    fn duplicate_username_is_reported() {
        let (_dir, _db, conn) = setup();
        conn.insert_user("alice", "h1").unwrap();

        let err = conn.insert_user("alice", "h2").unwrap_err();
        assert!(matches!(err, DbError::UsernameTaken));
    }

    #[test]
    fn credentials_lookup() {
        let (_dir, _db, conn) = setup();
        let id = conn.insert_user("bob", "hash").unwrap();

        let creds = conn.get_user_credentials("bob").unwrap().unwrap();
        assert_eq!(creds.id, id);
        assert_eq!(creds.password_hash, "hash");
        assert!(conn.get_user_credentials("nobody").unwrap().is_none());
    }

    #[test]
    fn stats_for_user_without_reviews() {
        let (_dir, _db, conn) = setup();
        let id = user(&conn, "carol");

        let stats = conn.get_user_stats(id).unwrap();
        assert_eq!(stats.count, 0);
        assert!(stats.first_review.is_none());
        assert!(stats.last_review.is_none());
    }

    #[test]
    fn stats_and_reviews_with_ratings() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "dave");
        let critic = user(&conn, "erin");

        let first = conn.add_review("Alien", "Tense.", author, &[]).unwrap();
        let second = conn.add_review("Heat", "Long.", author, &[]).unwrap();
        conn.add_comment("agree", 4, critic, first).unwrap();
        conn.add_comment("meh", 1, critic, first).unwrap();

        let stats = conn.get_user_stats(author).unwrap();
        assert_eq!(stats.count, 2);
        assert!(stats.first_review.is_some());
        assert!(stats.first_review <= stats.last_review);

        let reviews = conn.get_user_reviews(author).unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].id, second);
        assert_eq!(reviews[0].comment_count, 0);
        assert_eq!(reviews[0].avg_rating, None);
        assert_eq!(reviews[1].comment_count, 2);
        assert_eq!(reviews[1].avg_rating, Some(2.5));

        assert!(conn.get_user_reviews(critic).unwrap().is_empty());
    }

    #[test]
    fn missing_user_is_none() {
        let (_dir, _db, conn) = setup();
        assert!(conn.get_user(42).unwrap().is_none());
    }
}
