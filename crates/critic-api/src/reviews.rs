use axum::{
    Extension,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, FormRejection};
use tracing::info;

use critic_db::Conn;
use critic_db::models::Review;
use critic_types::forms::{ConfirmForm, ReviewForm, SearchQuery};

use crate::{DbConn, EntityId};
use crate::error::AppError;
use crate::session::{Session, read_form};
use crate::views::{self, CommentFormValues, ReviewFormValues};

pub(crate) fn load_review(conn: &Conn, id: i64) -> Result<Review, AppError> {
    conn.get_review(id)?.ok_or(AppError::NotFound)
}

fn known_category_ids(conn: &Conn) -> Result<Vec<i64>, AppError> {
    Ok(conn.get_categories()?.into_iter().map(|c| c.id).collect())
}

/// Re-render a review form with the submitted values and a 422.
fn invalid_review_form(
    conn: &Conn,
    session: &Session,
    heading: &str,
    action: &str,
    form: &ReviewForm,
    error: &AppError,
) -> Result<Response, AppError> {
    let categories = conn.get_categories()?;
    let selected = form.selected_ids();
    let values = ReviewFormValues {
        movie_title: &form.movie_title,
        content: &form.content,
        selected: &selected,
    };
    let page = views::review_form(session, heading, action, &values, &categories, Some(error.to_string().as_str()));
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

pub async fn index(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
) -> Result<Html<String>, AppError> {
    let reviews = conn.get_all_reviews()?;
    let categories = conn.get_categories()?;
    Ok(views::index(&session, &reviews, &categories))
}

pub async fn new_review_form(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
) -> Result<Html<String>, AppError> {
    session.require_login()?;
    let categories = conn.get_categories()?;
    let values = ReviewFormValues {
        movie_title: "",
        content: "",
        selected: &[],
    };
    Ok(views::review_form(&session, "New review", "/review/new", &values, &categories, None))
}

pub async fn create_review(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    form: Result<Form<ReviewForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = session.require_login()?;
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    let input = match form.validate(&known_category_ids(&conn)?) {
        Ok(input) => input,
        Err(e) => {
            return invalid_review_form(&conn, &session, "New review", "/review/new", &form, &AppError::from(e));
        }
    };

    let review_id = conn.add_review(&input.movie_title, &input.content, user.id, &input.category_ids)?;
    info!("User {} created review {}", user.id, review_id);
    Ok(Redirect::to(&format!("/review/{review_id}")).into_response())
}

pub async fn show_review(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
) -> Result<Html<String>, AppError> {
    let review = load_review(&conn, id)?;
    let comments = conn.get_comments(id)?;
    let categories = conn.get_review_categories(id)?;
    Ok(views::review(&session, &review, &comments, &categories, &CommentFormValues::EMPTY, None))
}

pub async fn edit_review_form(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
) -> Result<Html<String>, AppError> {
    let user = session.require_login()?;
    let review = load_review(&conn, id)?;
    user.ensure_owns(review.user_id)?;

    let categories = conn.get_categories()?;
    let selected: Vec<i64> = conn.get_review_categories(id)?.into_iter().map(|c| c.id).collect();
    let values = ReviewFormValues {
        movie_title: &review.movie_title,
        content: &review.content,
        selected: &selected,
    };
    let action = format!("/review/{id}/edit");
    Ok(views::review_form(&session, "Edit review", &action, &values, &categories, None))
}

pub async fn update_review(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
    form: Result<Form<ReviewForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = session.require_login()?;
    let review = load_review(&conn, id)?;
    user.ensure_owns(review.user_id)?;
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    let input = match form.validate(&known_category_ids(&conn)?) {
        Ok(input) => input,
        Err(e) => {
            let action = format!("/review/{id}/edit");
            return invalid_review_form(&conn, &session, "Edit review", &action, &form, &AppError::from(e));
        }
    };

    conn.update_review(id, &input.movie_title, &input.content, &input.category_ids)?;
    info!("User {} updated review {}", user.id, id);
    Ok(Redirect::to(&format!("/review/{id}")).into_response())
}

pub async fn delete_review_form(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
) -> Result<Html<String>, AppError> {
    let user = session.require_login()?;
    let review = load_review(&conn, id)?;
    user.ensure_owns(review.user_id)?;
    Ok(views::delete_review(&session, &review))
}

pub async fn delete_review(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    EntityId(id): EntityId,
    form: Result<Form<ConfirmForm>, FormRejection>,
) -> Result<Response, AppError> {
    let user = session.require_login()?;
    let review = load_review(&conn, id)?;
    user.ensure_owns(review.user_id)?;
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    if form.confirm.is_none() {
        return Ok(Redirect::to(&format!("/review/{id}")).into_response());
    }

    conn.delete_review(id)?;
    info!("User {} deleted review {}", user.id, id);
    Ok(Redirect::to("/").into_response())
}

pub async fn search(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    Query(params): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let query = params.query.unwrap_or_default();
    let results = conn.search_reviews(&query)?;
    Ok(views::search(&session, &query, &results))
}
