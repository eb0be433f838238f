use axum::{
    Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, FormRejection};
use tracing::info;

use critic_db::Conn;
use critic_db::models::Comment;
use critic_types::forms::{CommentForm, ConfirmForm};

use crate::{DbConn, EntityId};
use crate::error::AppError;
use crate::reviews::load_review;
use crate::session::{Session, read_form};
use crate::views::{self, CommentFormValues};

fn load_comment(conn: &Conn, id: i64) -> Result<Comment, AppError> {
    conn.get_comment(id)?.ok_or(AppError::NotFound)
}

pub async fn create_comment(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = session.require_login()?;
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    let review_id = form.review_id().ok_or(AppError::NotFound)?;
    let review = load_review(&conn, review_id)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            // Show the review again with the half-written comment kept
            let comments = conn.get_comments(review_id)?;
            let categories = conn.get_review_categories(review_id)?;
            let values = CommentFormValues {
                content: &form.content,
                rating: &form.rating,
            };
            let page = views::review(&session, &review, &comments, &categories, &values, Some(e.to_string().as_str()));
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let comment_id = conn.add_comment(&input.content, input.rating, user.id, review_id)?;
    info!("User {} commented {} on review {}", user.id, comment_id, review_id);
    Ok(Redirect::to(&format!("/review/{review_id}")).into_response())
}

pub async fn edit_comment_form(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
) -> Result<Html<String>, AppError> {
    let user = session.require_login()?;
    let comment = load_comment(&conn, id)?;
    user.ensure_owns(comment.user_id)?;

    let rating = comment.rating.to_string();
    let values = CommentFormValues {
        content: &comment.content,
        rating: &rating,
    };
    Ok(views::edit_comment(&session, &comment, &values, None))
}

pub async fn update_comment(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = session.require_login()?;
    let comment = load_comment(&conn, id)?;
    user.ensure_owns(comment.user_id)?;
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            let values = CommentFormValues {
                content: &form.content,
                rating: &form.rating,
            };
            let page = views::edit_comment(&session, &comment, &values, Some(e.to_string().as_str()));
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    conn.update_comment(id, &input.content, input.rating)?;
    info!("User {} updated comment {}", user.id, id);
    Ok(Redirect::to(&format!("/review/{}", comment.review_id)).into_response())
}

pub async fn delete_comment_form(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
) -> Result<Html<String>, AppError> {
    let user = session.require_login()?;
    let comment = load_comment(&conn, id)?;
    user.ensure_owns(comment.user_id)?;
    Ok(views::delete_comment(&session, &comment))
}

pub async fn delete_comment(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
    form: Result<Form<ConfirmForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = session.require_login()?;
    let comment = load_comment(&conn, id)?;
    user.ensure_owns(comment.user_id)?;
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    if form.confirm.is_some() {
        conn.delete_comment(id)?;
        info!("User {} deleted comment {}", user.id, id);
    }
    Ok(Redirect::to(&format!("/review/{}", comment.review_id)).into_response())
}
