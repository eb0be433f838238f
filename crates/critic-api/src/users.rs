use axum::{Extension, response::Html};

use crate::{DbConn, EntityId};
use crate::error::AppError;
use crate::session::Session;
use crate::views;

/// Profile page: review count, first/last review dates and the user's reviews.
pub async fn show_user(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
) -> Result<Html<String>, AppError> {
    let user = conn.get_user(id)?.ok_or(AppError::NotFound)?;
    let stats = conn.get_user_stats(id)?;
    let reviews = conn.get_user_reviews(id)?;
    Ok(views::user(&session, &user, &stats, &reviews))
}
