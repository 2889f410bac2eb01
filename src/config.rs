//! Process configuration read from the environment.

use crate::db::pool::DEFAULT_MAX_CONNECTIONS;
use crate::services::review_service::DEFAULT_REQUEST_TIMEOUT;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file. Defaults to `reviewer-assign.db` in the working directory.
    pub database_path: PathBuf,
    pub port: u16,
    /// Bound on concurrently open store sessions.
    pub max_connections: u32,
    /// Deadline applied to every operation unless a caller asks for less.
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_path = lookup("DATABASE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("reviewer-assign.db"));

        let port = parse_or(&lookup, "PORT", 8080u16).context("PORT must be a valid port number")?;

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)
            .context("DB_MAX_CONNECTIONS must be a valid number")?;
        anyhow::ensure!(max_connections > 0, "DB_MAX_CONNECTIONS must be at least 1");

        let timeout_ms = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
        )
        .context("REQUEST_TIMEOUT_MS must be a valid number")?;
        anyhow::ensure!(timeout_ms > 0, "REQUEST_TIMEOUT_MS must be at least 1");

        Ok(Config {
            database_path,
            port,
            max_connections,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, T::Err> {
    match lookup(key).filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw.trim().parse::<T>(),
        None => Ok(default),
    }
}
