use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::{Form, FormRejection};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::AppState;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "critic_session";

const SESSION_DAYS: i64 = 30;
const CSRF_TOKEN_BYTES: usize = 16;

/// Per-visitor session, carried in a signed cookie. Every visitor has one,
/// logged in or not, so that every form can carry a CSRF token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub csrf_token: String,
    exp: usize,
}

/// The logged-in user behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            username: None,
            csrf_token: new_csrf_token(),
            exp: expiry(),
        }
    }

    /// Session after a successful login. The CSRF token is rotated.
    pub fn authenticated(user_id: i64, username: &str) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username.to_string()),
            ..Self::anonymous()
        }
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        Some(CurrentUser {
            id: self.user_id?,
            username: self.username.clone().unwrap_or_default(),
        })
    }

    pub fn require_login(&self) -> Result<CurrentUser, AppError> {
        self.current_user().ok_or_else(|| {
            warn!("Rejected anonymous request to a login-only page");
            AppError::Forbidden
        })
    }

    /// The submitted token must be present and equal the session's.
    pub fn check_csrf(&self, submitted: &str) -> Result<(), AppError> {
        if submitted.is_empty() || submitted != self.csrf_token {
            warn!("CSRF token mismatch (user {:?})", self.user_id);
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

/// Unwrap a submitted form. A body that did not parse as a form has no
/// readable CSRF token, so it is refused the same way a missing token is.
pub fn read_form<T>(form: Result<Form<T>, FormRejection>) -> Result<T, AppError> {
    match form {
        Ok(Form(inner)) => Ok(inner),
        Err(rejection) => {
            warn!("Refusing unreadable form body: {}", rejection);
            Err(AppError::Forbidden)
        }
    }
}

impl CurrentUser {
    pub fn ensure_owns(&self, owner_id: i64) -> Result<(), AppError> {
        if self.id != owner_id {
            warn!("User {} denied access to entity owned by {}", self.id, owner_id);
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

fn new_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn expiry() -> usize {
    (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize
}

/// HS256 keys used to sign and verify session cookies.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn encode(&self, session: &Session) -> anyhow::Result<String> {
        Ok(encode(&Header::default(), session, &self.encoding)?)
    }

    /// `None` for tampered, expired or malformed tokens.
    pub fn decode(&self, token: &str) -> Option<Session> {
        decode::<Session>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| debug!("Discarding session cookie: {}", e))
            .ok()
    }
}

/// Attach `session` to a response; the session layer writes it to the cookie.
pub fn with_session(response: impl IntoResponse, session: Session) -> Response {
    let mut response = response.into_response();
    response.extensions_mut().insert(session);
    response
}

/// Load the session from the cookie (or start one) and make it available to
/// handlers. Writes the cookie back when the session is new or a handler
/// replaced it.
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let loaded = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.decode(cookie.value()));
    let is_new = loaded.is_none();
    let session = loaded.unwrap_or_else(Session::anonymous);

    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;

    let outgoing = match response.extensions_mut().remove::<Session>() {
        Some(replaced) => replaced,
        None if is_new => session,
        None => return response,
    };

    match state.sessions.encode(&outgoing) {
        Ok(token) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (jar.add(cookie), response).into_response()
        }
        Err(e) => {
            error!("Failed to sign session cookie: {:#}", e);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_session_has_token_but_no_user() {
        let session = Session::anonymous();
        assert_eq!(session.csrf_token.len(), CSRF_TOKEN_BYTES * 2);
        assert!(session.current_user().is_none());
        assert!(matches!(session.require_login(), Err(AppError::Forbidden)));
    }

    #[test]
    fn login_rotates_csrf_token() {
        let before = Session::anonymous();
        let after = Session::authenticated(7, "ann");
        assert_ne!(before.csrf_token, after.csrf_token);
        assert_eq!(
            after.require_login().unwrap(),
            CurrentUser {
                id: 7,
                username: "ann".into()
            }
        );
    }

    #[test]
    fn csrf_check() {
        let session = Session::anonymous();
        let token = session.csrf_token.clone();
        assert!(session.check_csrf(&token).is_ok());
        assert!(matches!(session.check_csrf(""), Err(AppError::Forbidden)));
        assert!(matches!(session.check_csrf("deadbeef"), Err(AppError::Forbidden)));
    }

    #[test]
    fn ownership() {
        let user = CurrentUser {
            id: 1,
            username: "ann".into(),
        };
        assert!(user.ensure_owns(1).is_ok());
        assert!(matches!(user.ensure_owns(2), Err(AppError::Forbidden)));
    }

    #[test]
    fn cookie_roundtrip_and_tamper() {
        let keys = SessionKeys::new("test-secret");
        let session = Session::authenticated(3, "bo");
        let token = keys.encode(&session).unwrap();

        let decoded = keys.decode(&token).unwrap();
        assert_eq!(decoded.user_id, Some(3));
        assert_eq!(decoded.csrf_token, session.csrf_token);

        let other = SessionKeys::new("another-secret");
        assert!(other.decode(&token).is_none());
        assert!(keys.decode("not-a-token").is_none());
    }
}
