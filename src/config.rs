use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub log_dir: String,

    // Rate limiting, 0 disables the limiter
    pub rate_attendance_per_min: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rate_attendance_per_min = match lookup("RATE_ATTENDANCE_PER_MIN") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("RATE_ATTENDANCE_PER_MIN must be a number, got {raw:?}"))?,
            None => 0,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://attendance.db".to_string()),
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:5000".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            rate_attendance_per_min,
        })
    }
}
