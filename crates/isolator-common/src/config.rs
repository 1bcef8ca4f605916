//! Isolator configuration.
//!
//! Configuration is loaded from environment variables with defaults that
//! suit a local test run. The same values are read by the test-side client
//! (cookie name, base URL, connection pool) and by the service-side router
//! (cookie name, session sweeping).

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default name of the cookie carrying the session token.
pub const DEFAULT_COOKIE_NAME: &str = "mock_session";

/// Default base URL of the service under test.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default bound on pooled idle connections per host.
pub const DEFAULT_MAX_CONNECTIONS: usize = 20;

/// Default idle lifetime of a pooled connection in seconds.
pub const DEFAULT_CONNECTION_TTL_SECONDS: u64 = 5;

/// Default idle time in seconds before a session is swept from the registry.
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 900;

/// Default sweeper interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Isolator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cookie carrying the session token (default: "mock_session").
    pub cookie_name: String,

    /// Base URL of the service under test, without trailing slash.
    pub base_url: String,

    /// Maximum idle pooled connections per host (default: 20).
    pub max_connections: usize,

    /// Idle lifetime of a pooled connection (default: 5s).
    pub connection_ttl: Duration,

    /// Idle time before the sweeper evicts a session (default: 900s).
    pub session_ttl: Duration,

    /// How often the sweeper runs (default: 60s).
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_ttl: Duration::from_secs(DEFAULT_CONNECTION_TTL_SECONDS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid cookie name: {0}")]
    InvalidCookieName(String),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any variable is present but invalid.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let cookie_name = vars
            .get("ISOLATOR_COOKIE_NAME")
            .cloned()
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());
        validate_cookie_name(&cookie_name)?;

        let base_url = vars
            .get("ISOLATOR_BASE_URL")
            .map_or(DEFAULT_BASE_URL, String::as_str)
            .trim_end_matches('/')
            .to_string();

        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "ISOLATOR_BASE_URL".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let max_connections = parse_positive(
            vars,
            "ISOLATOR_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS as u64,
        )?;
        let max_connections =
            usize::try_from(max_connections).map_err(|e| ConfigError::InvalidValue {
                var: "ISOLATOR_MAX_CONNECTIONS".to_string(),
                reason: e.to_string(),
            })?;

        let connection_ttl = Duration::from_secs(parse_positive(
            vars,
            "ISOLATOR_CONNECTION_TTL_SECONDS",
            DEFAULT_CONNECTION_TTL_SECONDS,
        )?);

        let session_ttl = Duration::from_secs(parse_positive(
            vars,
            "ISOLATOR_SESSION_TTL_SECONDS",
            DEFAULT_SESSION_TTL_SECONDS,
        )?);

        let sweep_interval = Duration::from_secs(parse_positive(
            vars,
            "ISOLATOR_SWEEP_INTERVAL_SECONDS",
            DEFAULT_SWEEP_INTERVAL_SECONDS,
        )?);

        Ok(Config {
            cookie_name,
            base_url,
            max_connections,
            connection_ttl,
            session_ttl,
            sweep_interval,
        })
    }
}

/// Cookie names must be RFC 6265 tokens.
fn validate_cookie_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidCookieName(
            "cookie name must not be empty".to_string(),
        ));
    }

    let is_token_char = |c: char| {
        c.is_ascii_graphic()
            && !matches!(
                c,
                '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']'
                    | '?' | '=' | '{' | '}'
            )
    };

    if let Some(c) = name.chars().find(|c| !is_token_char(*c)) {
        return Err(ConfigError::InvalidCookieName(format!(
            "'{name}' contains invalid character {c:?}"
        )));
    }

    Ok(())
}

fn parse_positive(
    vars: &HashMap<String, String>,
    var: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(var) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| ConfigError::InvalidValue {
        var: var.to_string(),
        reason: format!("must be a valid positive integer, got '{value_str}': {e}"),
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(value)
}
