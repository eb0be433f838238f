//! Server-rendered HTML pages.
//!
//! Every value that came from a user goes through [`escape`]. Forms carry the
//! session's CSRF token in a hidden `csrf_token` field.

use std::fmt::Write;

use axum::http::StatusCode;
use axum::response::Html;

use critic_db::models::{Category, Comment, Review, ReviewSummary, User, UserReview, UserStats};
use critic_types::forms::{MAX_RATING, MIN_RATING};

use crate::session::Session;

/// Values echoed back into the review form.
pub struct ReviewFormValues<'a> {
    pub movie_title: &'a str,
    pub content: &'a str,
    pub selected: &'a [i64],
}

/// Values echoed back into a comment form.
pub struct CommentFormValues<'a> {
    pub content: &'a str,
    pub rating: &'a str,
}

impl CommentFormValues<'static> {
    pub const EMPTY: Self = CommentFormValues {
        content: "",
        rating: "",
    };
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn rating(avg: Option<f64>) -> String {
    avg.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string())
}

fn csrf_field(session: &Session) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        escape(&session.csrf_token)
    )
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error">Error: {}</p>"#, escape(e)))
        .unwrap_or_default()
}

fn layout(session: &Session, title: &str, body: &str) -> Html<String> {
    let nav = match session.current_user() {
        Some(user) => format!(
            r#"<a href="/user/{}">{}</a> | <a href="/review/new">New review</a> |
            <form action="/logout" method="post" class="inline">{}<button>Log out</button></form>"#,
            user.id,
            escape(&user.username),
            csrf_field(session),
        ),
        None => r#"<a href="/login">Log in</a> | <a href="/register">Register</a>"#.to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} - Critic</title></head>
<body>
<nav><a href="/">Critic</a> | {nav}
<form action="/search" method="get" class="inline"><input name="query" placeholder="Search"><button>Search</button></form>
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    ))
}

fn summary_list(reviews: &[ReviewSummary]) -> String {
    if reviews.is_empty() {
        return "<p>No reviews.</p>".to_string();
    }
    let mut out = String::from("<ul class=\"reviews\">");
    for r in reviews {
        let _ = write!(
            out,
            r#"<li><a href="/review/{id}">{title}</a> by <a href="/user/{uid}">{user}</a>, {at}
<p>{preview}</p><small>{count} comments, average rating {avg}</small></li>"#,
            id = r.id,
            title = escape(&r.movie_title),
            uid = r.user_id,
            user = escape(&r.username),
            at = escape(&r.created_at),
            preview = escape(&r.content_preview),
            count = r.comment_count,
            avg = rating(r.avg_rating),
        );
    }
    out.push_str("</ul>");
    out
}

fn category_names(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| escape(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn index(session: &Session, reviews: &[ReviewSummary], categories: &[Category]) -> Html<String> {
    let body = format!(
        "<p>Categories: {}</p>{}",
        category_names(categories),
        summary_list(reviews)
    );
    layout(session, "Reviews", &body)
}

pub fn register(session: &Session, username: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{error}<form action="/create_user" method="post">{csrf}
<label>Username <input name="username" value="{username}"></label>
<label>Password <input type="password" name="password1"></label>
<label>Password again <input type="password" name="password2"></label>
<button>Register</button>
</form>"#,
        error = error_banner(error),
        csrf = csrf_field(session),
        username = escape(username),
    );
    layout(session, "Register", &body)
}

pub fn login(session: &Session, username: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"{error}<form action="/login" method="post">{csrf}
<label>Username <input name="username" value="{username}"></label>
<label>Password <input type="password" name="password"></label>
<button>Log in</button>
</form>"#,
        error = error_banner(error),
        csrf = csrf_field(session),
        username = escape(username),
    );
    layout(session, "Log in", &body)
}

/// Shared by the new and edit review pages.
pub fn review_form(
    session: &Session,
    heading: &str,
    action: &str,
    values: &ReviewFormValues<'_>,
    categories: &[Category],
    error: Option<&str>,
) -> Html<String> {
    let mut boxes = String::new();
    for c in categories {
        let checked = if values.selected.contains(&c.id) { " checked" } else { "" };
        let _ = write!(
            boxes,
            r#"<label><input type="checkbox" name="category_ids" value="{}"{}> {}</label>"#,
            c.id,
            checked,
            escape(&c.name)
        );
    }

    let body = format!(
        r#"{error}<form action="{action}" method="post">{csrf}
<label>Movie title <input name="movie_title" value="{title}"></label>
<label>Review <textarea name="content" rows="8">{content}</textarea></label>
<fieldset><legend>Categories</legend>{boxes}</fieldset>
<button>Save</button>
</form>"#,
        error = error_banner(error),
        action = escape(action),
        csrf = csrf_field(session),
        title = escape(values.movie_title),
        content = escape(values.content),
    );
    layout(session, heading, &body)
}

fn rating_select(selected: &str) -> String {
    let mut out = String::from(r#"<select name="rating"><option value="">-</option>"#);
    for r in MIN_RATING..=MAX_RATING {
        let mark = if selected.trim() == r.to_string() { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{r}"{mark}>{r}</option>"#);
    }
    out.push_str("</select>");
    out
}

pub fn review(
    session: &Session,
    review: &Review,
    comments: &[Comment],
    categories: &[Category],
    comment_form: &CommentFormValues<'_>,
    error: Option<&str>,
) -> Html<String> {
    let viewer = session.current_user();
    let mut body = format!(
        r#"<p>by <a href="/user/{uid}">{user}</a>, {at}</p>
<p>Categories: {cats}</p>
<div class="content">{content}</div>
<p>{count} comments, average rating {avg}</p>"#,
        uid = review.user_id,
        user = escape(&review.username),
        at = escape(&review.created_at),
        cats = category_names(categories),
        content = escape(&review.content),
        count = review.comment_count,
        avg = rating(review.avg_rating),
    );

    if viewer.as_ref().is_some_and(|u| u.id == review.user_id) {
        let _ = write!(
            body,
            r#"<p><a href="/review/{id}/edit">Edit</a> | <a href="/review/{id}/delete">Delete</a></p>"#,
            id = review.id
        );
    }

    body.push_str("<h2>Comments</h2><ul class=\"comments\">");
    for c in comments {
        let _ = write!(
            body,
            r#"<li><a href="/user/{uid}">{user}</a> ({at}) rated {rating}/5<p>{content}</p>"#,
            uid = c.user_id,
            user = escape(&c.username),
            at = escape(&c.created_at),
            rating = c.rating,
            content = escape(&c.content),
        );
        if viewer.as_ref().is_some_and(|u| u.id == c.user_id) {
            let _ = write!(
                body,
                r#"<a href="/comment/{id}/edit">Edit</a> | <a href="/comment/{id}/delete">Delete</a>"#,
                id = c.id
            );
        }
        body.push_str("</li>");
    }
    body.push_str("</ul>");

    if viewer.is_some() {
        let _ = write!(
            body,
            r#"{error}<form action="/comment/new" method="post">{csrf}
<input type="hidden" name="review_id" value="{id}">
<label>Comment <textarea name="content" rows="4">{content}</textarea></label>
<label>Rating {select}</label>
<button>Comment</button>
</form>"#,
            error = error_banner(error),
            csrf = csrf_field(session),
            id = review.id,
            content = escape(comment_form.content),
            select = rating_select(comment_form.rating),
        );
    }

    layout(session, &review.movie_title, &body)
}

fn confirm_form(session: &Session, action: &str, prompt: &str, cancel: &str) -> String {
    format!(
        r#"<p>{prompt}</p><form action="{action}" method="post">{csrf}
<button name="confirm" value="1">Delete</button>
<button name="cancel" value="1">Cancel</button>
</form><p><a href="{cancel}">Back</a></p>"#,
        prompt = escape(prompt),
        action = escape(action),
        csrf = csrf_field(session),
        cancel = escape(cancel),
    )
}

pub fn delete_review(session: &Session, review: &Review) -> Html<String> {
    let body = confirm_form(
        session,
        &format!("/review/{}/delete", review.id),
        &format!("Delete the review of {}? Its comments go with it.", review.movie_title),
        &format!("/review/{}", review.id),
    );
    layout(session, "Delete review", &body)
}

pub fn edit_comment(
    session: &Session,
    comment: &Comment,
    values: &CommentFormValues<'_>,
    error: Option<&str>,
) -> Html<String> {
    let body = format!(
        r#"{error}<form action="/comment/{id}/edit" method="post">{csrf}
<label>Comment <textarea name="content" rows="4">{content}</textarea></label>
<label>Rating {select}</label>
<button>Save</button>
</form><p><a href="/review/{review}">Back</a></p>"#,
        error = error_banner(error),
        id = comment.id,
        csrf = csrf_field(session),
        content = escape(values.content),
        select = rating_select(values.rating),
        review = comment.review_id,
    );
    layout(session, "Edit comment", &body)
}

pub fn delete_comment(session: &Session, comment: &Comment) -> Html<String> {
    let body = confirm_form(
        session,
        &format!("/comment/{}/delete", comment.id),
        &format!("Delete your comment \"{}\"?", comment.content),
        &format!("/review/{}", comment.review_id),
    );
    layout(session, "Delete comment", &body)
}

pub fn search(session: &Session, query: &str, results: &[ReviewSummary]) -> Html<String> {
    let body = if query.trim().is_empty() {
        "<p>Type something to search for.</p>".to_string()
    } else {
        format!(
            "<p>{} results for \"{}\"</p>{}",
            results.len(),
            escape(query),
            summary_list(results)
        )
    };
    layout(session, "Search", &body)
}

pub fn user(session: &Session, user: &User, stats: &UserStats, reviews: &[UserReview]) -> Html<String> {
    let mut body = format!("<p>{} reviews", stats.count);
    if let (Some(first), Some(last)) = (&stats.first_review, &stats.last_review) {
        let _ = write!(body, ", first {}, latest {}", escape(first), escape(last));
    }
    body.push_str("</p><ul class=\"reviews\">");
    for r in reviews {
        let _ = write!(
            body,
            r#"<li><a href="/review/{id}">{title}</a>, {at}: {count} comments, average rating {avg}</li>"#,
            id = r.id,
            title = escape(&r.movie_title),
            at = escape(&r.created_at),
            count = r.comment_count,
            avg = rating(r.avg_rating),
        );
    }
    body.push_str("</ul>");
    layout(session, &user.username, &body)
}

/// Bare page for 4xx/5xx responses; rendered without the session.
pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>{code}</title></head>
<body><h1>{code}</h1><p>{message}</p><p><a href="/">Home</a></p></body></html>"#,
        code = status,
        message = escape(message),
    ))
}
