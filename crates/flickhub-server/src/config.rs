use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use tracing::warn;

const DEV_SECRET: &str = "dev-secret-change-me";

/// Accepted range for FLICKHUB_SESSION_DAYS.
const SESSION_DAYS: std::ops::RangeInclusive<i64> = 1..=3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub jwt_secret: String,
    pub session_days: i64,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset keys fall back to defaults;
    /// set but unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("FLICKHUB_JWT_SECRET").unwrap_or_else(|| {
            warn!("FLICKHUB_JWT_SECRET not set, using the development secret");
            DEV_SECRET.into()
        });

        let session_days = parse_or(&lookup, "FLICKHUB_SESSION_DAYS", 30)?;
        if !SESSION_DAYS.contains(&session_days) {
            bail!(
                "FLICKHUB_SESSION_DAYS must be between {} and {}, got {}",
                SESSION_DAYS.start(),
                SESSION_DAYS.end(),
                session_days
            );
        }

        Ok(Self {
            host: lookup("FLICKHUB_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "FLICKHUB_PORT", 3000)?,
            db_path: lookup("FLICKHUB_DB_PATH")
                .unwrap_or_else(|| "flickhub.db".into())
                .into(),
            db_readers: parse_or(&lookup, "FLICKHUB_DB_READERS", flickhub_db::DEFAULT_READERS)?,
            jwt_secret,
            session_days,
            cookie_secure: parse_or(&lookup, "FLICKHUB_COOKIE_SECURE", false)?,
        })
    }

    pub fn session_ttl(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_days(self.session_days)
            .with_context(|| format!("session length of {} days is out of range", self.session_days))
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
