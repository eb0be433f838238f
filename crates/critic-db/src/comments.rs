use rusqlite::Row;

use crate::models::Comment;
use crate::{Conn, Result};

impl Conn {
    pub fn add_comment(&self, content: &str, rating: i64, user_id: i64, review_id: i64) -> Result<i64> {
        self.insert(
            "INSERT INTO comments (content, rating, created_at, user_id, review_id)
             VALUES (?1, ?2, datetime('now'), ?3, ?4)",
            (content, rating, user_id, review_id),
        )
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        self.query_opt(
            "SELECT c.id, c.content, c.rating, c.created_at, c.user_id, u.username, c.review_id
             FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.id = ?1",
            [id],
            map_comment,
        )
    }

    /// Comments on a review in the order they were written.
    pub fn get_comments(&self, review_id: i64) -> Result<Vec<Comment>> {
        self.query_rows(
            "SELECT c.id, c.content, c.rating, c.created_at, c.user_id, u.username, c.review_id
             FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.review_id = ?1
             ORDER BY c.created_at, c.id",
            [review_id],
            map_comment,
        )
    }

    pub fn update_comment(&self, id: i64, content: &str, rating: i64) -> Result<()> {
        self.execute(
            "UPDATE comments SET content = ?1, rating = ?2 WHERE id = ?3",
            (content, rating, id),
        )?;
        Ok(())
    }

    pub fn delete_comment(&self, id: i64) -> Result<()> {
        self.execute("DELETE FROM comments WHERE id = ?1", [id])?;
        Ok(())
    }
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        content: row.get(1)?,
        rating: row.get(2)?,
        created_at: row.get(3)?,
        user_id: row.get(4)?,
        username: row.get(5)?,
        review_id: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{setup, user};

    #[test]
    fn comments_keep_insertion_order() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let other = user(&conn, "bob");
        let review = conn.add_review("Stalker", "Zone.", author, &[]).unwrap();

        let first = conn.add_comment("first", 5, other, review).unwrap();
        let second = conn.add_comment("second", 2, author, review).unwrap();

        let comments = conn.get_comments(review).unwrap();
        let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(comments[0].username, "bob");
        assert_eq!(comments[1].rating, 2);
    }

    #[test]
    fn update_and_delete_comment() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let review = conn.add_review("Mirror", "Memory.", author, &[]).unwrap();
        let id = conn.add_comment("draft", 3, author, review).unwrap();

        conn.update_comment(id, "final", 4).unwrap();
        let comment = conn.get_comment(id).unwrap().unwrap();
        assert_eq!(comment.content, "final");
        assert_eq!(comment.rating, 4);
        assert_eq!(comment.review_id, review);
        assert_eq!(comment.user_id, author);

        conn.delete_comment(id).unwrap();
        assert!(conn.get_comment(id).unwrap().is_none());
    }

    #[test]
    fn rating_out_of_range_is_rejected_by_schema() {
        let (_dir, _db, conn) = setup();
        let author = user(&conn, "alice");
        let review = conn.add_review("Nostalghia", "Candle.", author, &[]).unwrap();

        assert!(conn.add_comment("zero", 0, author, review).is_err());
        assert!(conn.add_comment("six", 6, author, review).is_err());
        assert!(conn.get_comments(review).unwrap().is_empty());
    }
}
