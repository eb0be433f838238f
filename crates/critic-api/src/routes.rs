use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::session::session_layer;
use crate::{AppState, auth, comments, reviews, users};

pub fn router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(reviews::index))
        .route("/register", get(auth::register_form))
        .route("/create_user", post(auth::create_user))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/review/new", get(reviews::new_review_form).post(reviews::create_review))
        .route("/review/{id}", get(reviews::show_review))
        .route("/review/{id}/edit", get(reviews::edit_review_form).post(reviews::update_review))
        .route("/review/{id}/delete", get(reviews::delete_review_form).post(reviews::delete_review))
        .route("/comment/new", post(comments::create_comment))
        .route("/comment/{id}/edit", get(comments::edit_comment_form).post(comments::update_comment))
        .route("/comment/{id}/delete", get(comments::delete_comment_form).post(comments::delete_comment))
        .route("/search", get(reviews::search))
        .route("/user/{id}", get(users::show_user))
        .layer(middleware::from_fn_with_state(state.clone(), session_layer));

    Router::new()
        .merge(pages)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
