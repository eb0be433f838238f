use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use critic_db::DbError;
use critic_types::ValidationError;

use crate::views;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad form input. Handlers normally catch this and re-render the form.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// Not logged in, bad CSRF token, or not the owner.
    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UsernameTaken => AppError::Conflict(err.to_string()),
            other => AppError::Internal(other.into()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!("Request failed: {:#}", e);
                "something went wrong".to_string()
            }
            other => other.to_string(),
        };

        (status, views::error_page(status, &message)).into_response()
    }
}
