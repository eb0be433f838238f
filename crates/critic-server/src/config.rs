use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub session_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let db_path = var_or("CRITIC_DB_PATH", "critic.db").into();
        let host = var_or("CRITIC_HOST", "0.0.0.0");
        let port: u16 = var_or("CRITIC_PORT", "3000")
            .parse()
            .context("CRITIC_PORT is not a valid port")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let session_secret = env::var("CRITIC_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("CRITIC_SESSION_SECRET is unset or still a placeholder");
        }

        Ok(Self {
            db_path,
            addr,
            session_secret,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}
