pub mod accounts;
pub mod auth;
pub mod comments;
pub mod error;
pub mod reviews;
pub mod routes;
pub mod session;
pub mod users;
pub mod views;

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use critic_db::{Conn, Database};

use crate::error::AppError;
use crate::session::SessionKeys;

pub use routes::router;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionKeys,
}

impl AppStateInner {
    pub fn new(db: Database, session_secret: &str) -> AppState {
        Arc::new(Self {
            db,
            sessions: SessionKeys::new(session_secret),
        })
    }
}

/// Database connection owned by the current request. Opened when the
/// handler asks for it and closed when the handler returns.
pub struct DbConn(pub Conn);

impl FromRequestParts<AppState> for DbConn {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let conn = state.db.connect()?;
        Ok(DbConn(conn))
    }
}

/// Numeric id from the route path. Anything that is not an `i64` names no
/// entity and answers 404.
pub struct EntityId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for EntityId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        Ok(EntityId(id))
    }
}
