//! Registration and credential checks.

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{info, warn};

use critic_db::Conn;
use critic_types::forms::RegisterForm;

use crate::error::AppError;

/// Validate the form and store the user with an Argon2id hash.
///
/// Fails with [`AppError::Validation`] on bad input and
/// [`AppError::Conflict`] when the username is taken.
pub fn create_user(conn: &Conn, form: &RegisterForm) -> Result<(), AppError> {
    let new_user = form.validate()?;
    let password_hash = hash_password(&new_user.password)?;

    let user_id = conn.insert_user(&new_user.username, &password_hash)?;
    info!("Registered user {} ({})", new_user.username, user_id);
    Ok(())
}

/// Returns the user id when the credentials match. A wrong password is not
/// an error.
pub fn check_login(conn: &Conn, username: &str, password: &str) -> Result<Option<i64>, AppError> {
    let Some(creds) = conn.get_user_credentials(username.trim())? else {
        return Ok(None);
    };

    let parsed_hash = match PasswordHash::new(&creds.password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Unreadable password hash for user {}: {}", creds.id, e);
            return Ok(None);
        }
    };

    let matches = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(matches.then_some(creds.id))
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}
