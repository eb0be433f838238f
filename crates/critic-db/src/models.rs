//! Database row types. These map directly to SQLite query results and are
//! handed to the view layer as-is.

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Login lookup row; the only place the password hash leaves the database.
pub struct UserCredentials {
    pub id: i64,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub count: i64,
    pub first_review: Option<String>,
    pub last_review: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserReview {
    pub id: i64,
    pub movie_title: String,
    pub created_at: String,
    pub comment_count: i64,
    pub avg_rating: Option<f64>,
}

/// Listing row: content is cut to [`crate::reviews::PREVIEW_CHARS`].
#[derive(Debug, Clone)]
pub struct ReviewSummary {
    pub id: i64,
    pub movie_title: String,
    pub content_preview: String,
    pub created_at: String,
    pub user_id: i64,
    pub username: String,
    pub comment_count: i64,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Review {
    pub id: i64,
    pub movie_title: String,
    pub content: String,
    pub created_at: String,
    pub user_id: i64,
    pub username: String,
    pub comment_count: i64,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub rating: i64,
    pub created_at: String,
    pub user_id: i64,
    pub username: String,
    pub review_id: i64,
}
