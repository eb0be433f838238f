use axum::{
    Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, FormRejection};
use tracing::info;

use critic_types::forms::{CsrfForm, LoginForm, RegisterForm};

use crate::DbConn;
use crate::accounts;
use crate::error::AppError;
use crate::session::{Session, read_form, with_session};
use crate::views;

pub async fn register_form(Extension(session): Extension<Session>) -> Html<String> {
    views::register(&session, "", None)
}

pub async fn create_user(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    form: Result<Form<RegisterForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    match accounts::create_user(&conn, &form) {
        Ok(()) => Ok(Redirect::to("/login").into_response()),
        Err(e @ (AppError::Validation(_) | AppError::Conflict(_))) => Ok((
            e.status(),
            views::register(&session, &form.username, Some(e.to_string().as_str())),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

pub async fn login_form(Extension(session): Extension<Session>) -> Html<String> {
    views::login(&session, "", None)
}

pub async fn login(
    Extension(session): Extension<Session>,
    DbConn(conn): DbConn,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    match accounts::check_login(&conn, &form.username, &form.password)? {
        Some(user_id) => {
            let username = form.username.trim();
            info!("User {} ({}) logged in", username, user_id);
            Ok(with_session(
                Redirect::to("/"),
                Session::authenticated(user_id, username),
            ))
        }
        None => {
            info!("Failed login for {:?}", form.username);
            Ok((
                StatusCode::UNAUTHORIZED,
                views::login(&session, &form.username, Some("wrong username or password")),
            )
                .into_response())
        }
    }
}

/// Drop the login and start over with a fresh anonymous session.
pub async fn logout(
    Extension(session): Extension<Session>,
    form: Result<Form<CsrfForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = read_form(form)?;
    session.check_csrf(&form.csrf_token)?;

    if let Some(user) = session.current_user() {
        info!("User {} ({}) logged out", user.username, user.id);
    }
    Ok(with_session(Redirect::to("/"), Session::anonymous()))
}
