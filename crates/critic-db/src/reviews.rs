use rusqlite::{Connection, Row};
use tracing::debug;

use crate::models::{Category, Review, ReviewSummary};
use crate::{Conn, Result};

/// Number of characters of review content shown in listings.
pub const PREVIEW_CHARS: i64 = 200;

const SUMMARY_COLUMNS: &str = "
    SELECT r.id, r.movie_title, substr(r.content, 1, ?1), r.created_at,
           r.user_id, u.username, COUNT(c.id), ROUND(AVG(c.rating), 1)
    FROM reviews r
    JOIN users u ON u.id = r.user_id
    LEFT JOIN comments c ON c.review_id = r.id";

impl Conn {
    /// Insert a review stamped with the current time and link it to
    /// `category_ids`. Returns the new review id.
    pub fn add_review(
        &self,
        movie_title: &str,
        content: &str,
        user_id: i64,
        category_ids: &[i64],
    ) -> Result<i64> {
        self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO reviews (movie_title, content, created_at, user_id)
                 VALUES (?1, ?2, datetime('now'), ?3)",
                (movie_title, content, user_id),
            )?;
            let review_id = conn.last_insert_rowid();
            link_categories(conn, review_id, category_ids)?;
            debug!("Inserted review {} with {} categories", review_id, category_ids.len());
            Ok(review_id)
        })
    }

    pub fn get_review(&self, id: i64) -> Result<Option<Review>> {
        self.query_opt(
            "SELECT r.id, r.movie_title, r.content, r.created_at, r.user_id, u.username,
                    COUNT(c.id), ROUND(AVG(c.rating), 1)
             FROM reviews r
             JOIN users u ON u.id = r.user_id
             LEFT JOIN comments c ON c.review_id = r.id
             WHERE r.id = ?1
             GROUP BY r.id",
            [id],
            |row| {
                Ok(Review {
                    id: row.get(0)?,
                    movie_title: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                    user_id: row.get(4)?,
                    username: row.get(5)?,
                    comment_count: row.get(6)?,
                    avg_rating: row.get(7)?,
                })
            },
        )
    }

    /// All reviews, newest first, with content cut to a preview.
    pub fn get_all_reviews(&self) -> Result<Vec<ReviewSummary>> {
        let sql = format!("{SUMMARY_COLUMNS} GROUP BY r.id ORDER BY r.id DESC");
        self.query_rows(&sql, [PREVIEW_CHARS], map_summary)
    }

    /// Case-insensitive substring match on title or content.
    pub fn search_reviews(&self, query: &str) -> Result<Vec<ReviewSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let pattern = format!("%{}%", escape_like(query));
        let sql = format!(
            "{SUMMARY_COLUMNS}
             WHERE r.movie_title LIKE ?2 ESCAPE '\\' OR r.content LIKE ?2 ESCAPE '\\'
             GROUP BY r.id
             ORDER BY r.created_at DESC, r.id DESC"
        );
        self.query_rows(&sql, (PREVIEW_CHARS, pattern), map_summary)
    }

    /// Overwrite title and content and replace the whole category set.
    pub fn update_review(
        &self,
        id: i64,
        movie_title: &str,
        content: &str,
        category_ids: &[i64],
    ) -> Result<()> {
        self.with_transaction(|conn| {
            conn.execute(
                "UPDATE reviews SET movie_title = ?1, content = ?2 WHERE id = ?3",
                (movie_title, content, id),
            )?;
            conn.execute("DELETE FROM review_categories WHERE review_id = ?1", [id])?;
            link_categories(conn, id, category_ids)?;
            Ok(())
        })
    }

    /// Delete comments, then category links, then the review itself.
    pub fn delete_review(&self, id: i64) -> Result<()> {
        self.with_transaction(|conn| {
            let comments = conn.execute("DELETE FROM comments WHERE review_id = ?1", [id])?;
            conn.execute("DELETE FROM review_categories WHERE review_id = ?1", [id])?;
            conn.execute("DELETE FROM reviews WHERE id = ?1", [id])?;
            debug!("Deleted review {} and {} comments", id, comments);
            Ok(())
        })
    }

    pub fn get_categories(&self) -> Result<Vec<Category>> {
        self.query_rows("SELECT id, name FROM categories ORDER BY name", [], map_category)
    }

    pub fn get_review_categories(&self, review_id: i64) -> Result<Vec<Category>> {
        self.query_rows(
            "SELECT c.id, c.name
             FROM categories c
             JOIN review_categories rc ON rc.category_id = c.id
             WHERE rc.review_id = ?1
             ORDER BY c.name",
            [review_id],
            map_category,
        )
    }
}

fn link_categories(conn: &Connection, review_id: i64, category_ids: &[i64]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO review_categories (review_id, category_id) VALUES (?1, ?2)",
    )?;
    for category_id in category_ids {
        stmt.execute((review_id, category_id))?;
    }
    Ok(())
}

/// Make `%`, `_` and `\` match literally inside a LIKE pattern.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<ReviewSummary> {
    Ok(ReviewSummary {
        id: row.get(0)?,
        movie_title: row.get(1)?,
        content_preview: row.get(2)?,
        created_at: row.get(3)?,
        user_id: row.get(4)?,
        username: row.get(5)?,
        comment_count: row.get(6)?,
        avg_rating: row.get(7)?,
    })
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{setup, user};

    fn linked_ids(conn: &Conn, review_id: i64) -> Vec<i64> {
        let mut ids: Vec<i64> = conn
            .get_review_categories(review_id)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn categories_are_seeded() {
        let (_dir, _db, conn) = setup();
        let names: Vec<String> = conn.get_categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["average", "bad", "good", "great", "masterpiece"]);
    }

    #[test]
    fn add_and_get_review() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");

        let id = conn.add_review("Solaris", "Slow and strange.", author, &[1, 3]).unwrap();
        let review = conn.get_review(id).unwrap().unwrap();
        assert_eq!(review.movie_title, "Solaris");
        assert_eq!(review.content, "Slow and strange.");
        assert_eq!(review.user_id, author);
        assert_eq!(review.username, "alice");
        assert_eq!(review.comment_count, 0);
        assert_eq!(review.avg_rating, None);
        assert_eq!(linked_ids(&conn, id), vec![1, 3]);
    }

    #[test]
    fn missing_review_is_none() {
        let (_dir, _db, conn) = setup();
        assert!(conn.get_review(999).unwrap().is_none());
    }

    #[test]
    fn update_replaces_category_links() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let id = conn.add_review("Ran", "Epic.", author, &[1, 3]).unwrap();

        conn.update_review(id, "Ran (1985)", "Still epic.", &[2]).unwrap();

        let review = conn.get_review(id).unwrap().unwrap();
        assert_eq!(review.movie_title, "Ran (1985)");
        assert_eq!(review.content, "Still epic.");
        assert_eq!(linked_ids(&conn, id), vec![2]);

        conn.update_review(id, "Ran", "Epic.", &[]).unwrap();
        assert!(linked_ids(&conn, id).is_empty());
    }

    #[test]
    fn delete_removes_comments_and_links() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let other = user(&conn, "bob");
        let id = conn.add_review("Ikiru", "Moving.", author, &[4, 5]).unwrap();
        let comment = conn.add_comment("yes", 5, other, id).unwrap();
        let keep = conn.add_review("Kwaidan", "Eerie.", author, &[4]).unwrap();

        conn.delete_review(id).unwrap();

        assert!(conn.get_review(id).unwrap().is_none());
        assert!(conn.get_comment(comment).unwrap().is_none());
        assert!(conn.get_comments(id).unwrap().is_empty());
        assert!(conn.get_review_categories(id).unwrap().is_empty());
        assert_eq!(linked_ids(&conn, keep), vec![4]);
    }

    #[test]
    fn listing_truncates_content_and_aggregates() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let other = user(&conn, "bob");
        let long = "x".repeat(500);
        let first = conn.add_review("Long", &long, author, &[]).unwrap();
        let second = conn.add_review("Short", "ok", author, &[]).unwrap();
        conn.add_comment("a", 3, other, first).unwrap();
        conn.add_comment("b", 4, other, first).unwrap();
        conn.add_comment("c", 4, other, first).unwrap();

        let all = conn.get_all_reviews().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second);
        assert_eq!(all[1].id, first);
        assert_eq!(all[1].content_preview.chars().count(), 200);
        assert_eq!(all[1].comment_count, 3);
        assert_eq!(all[1].avg_rating, Some(3.7));
        assert_eq!(all[1].username, "alice");
    }

    #[test]
    fn search_matches_title_or_content() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let by_title = conn.add_review("The Thing", "Paranoia on ice.", author, &[]).unwrap();
        let by_content = conn.add_review("Alien", "Another THING in space.", author, &[]).unwrap();
        conn.add_review("Heat", "Cops and robbers.", author, &[]).unwrap();

        let mut ids: Vec<i64> = conn.search_reviews("thing").unwrap().into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec![by_title, by_content]);

        assert!(conn.search_reviews("zombie").unwrap().is_empty());
        assert!(conn.search_reviews("   ").unwrap().is_empty());
    }

    #[test]
    fn search_wildcards_are_literal() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let id = conn.add_review("8 1/2", "100% Fellini", author, &[]).unwrap();
        conn.add_review("Amarcord", "1000 memories", author, &[]).unwrap();

        let hits: Vec<i64> = conn.search_reviews("0%").unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(hits, vec![id]);
        assert!(conn.search_reviews("_").unwrap().is_empty());
    }

    #[test]
    fn escape_like_escapes_specials() {
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
