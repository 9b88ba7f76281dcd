use anyhow::{Context, Result};

use crate::client::refresh::{DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH};

const DEFAULT_SESSION_FILE: &str = ".hr-console-session.json";

/// Console configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: String,
    pub login_path: String,
    pub refresh_path: String,
    pub request_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            api_base_url: lookup("API_BASE_URL").with_context(|| {
                "Required environment variable 'API_BASE_URL' is not set".to_string()
            })?,
            session_file: or_default("SESSION_FILE", DEFAULT_SESSION_FILE),
            login_path: or_default("AUTH_LOGIN_PATH", DEFAULT_LOGIN_PATH),
            refresh_path: or_default("AUTH_REFRESH_PATH", DEFAULT_REFRESH_PATH),
            request_timeout_secs: or_default("REQUEST_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}
