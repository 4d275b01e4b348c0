//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so a session can start with zero
//! configuration against a local backend.

use std::time::Duration;

use ethica_shared::constants::{
    DEFAULT_API_URL, DEFAULT_NOTICE_TTL_SECS, DEFAULT_PAGE_SIZE, DEFAULT_PUSH_BUFFER,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the tracker HTTP API.
    /// Env: `ETHICA_API_URL`
    /// Default: `http://127.0.0.1:8000`
    pub api_url: String,

    /// Bearer token sent with every API request.
    /// Env: `ETHICA_API_TOKEN`
    /// Default: none.
    pub api_token: Option<String>,

    /// Per-request timeout.
    /// Env: `ETHICA_REQUEST_TIMEOUT_SECS`
    /// Default: `30`
    pub request_timeout: Duration,

    /// How long a transient notice stays visible.
    /// Env: `ETHICA_NOTICE_TTL_SECS`
    /// Default: `5`
    pub notice_ttl: Duration,

    /// Capacity of the push event channel.
    /// Env: `ETHICA_PUSH_BUFFER`
    /// Default: `64`
    pub push_buffer: usize,

    /// Applications per list page.
    /// Env: `ETHICA_PAGE_SIZE`
    /// Default: `10`
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            notice_ttl: Duration::from_secs(DEFAULT_NOTICE_TTL_SECS),
            push_buffer: DEFAULT_PUSH_BUFFER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ETHICA_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_url = url.to_string();
            } else {
                tracing::warn!(value = %url, "Invalid ETHICA_API_URL, using default");
            }
        }

        if let Some(token) = lookup("ETHICA_API_TOKEN") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }

        if let Some(secs) = parse_var(&lookup, "ETHICA_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var(&lookup, "ETHICA_NOTICE_TTL_SECS") {
            config.notice_ttl = Duration::from_secs(secs);
        }

        if let Some(n) = parse_var::<usize, _>(&lookup, "ETHICA_PUSH_BUFFER") {
            if n > 0 {
                config.push_buffer = n;
            }
        }

        if let Some(n) = parse_var::<u32, _>(&lookup, "ETHICA_PAGE_SIZE") {
            if n > 0 {
                config.page_size = n;
            }
        }

        config
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}
