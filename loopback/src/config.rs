//! Connection settings for a Loopback REST resource.

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the resource base URL
pub const API_URL_VAR: &str = "CRUD_STORE_API_URL";

/// Environment variable holding the request timeout in seconds
pub const API_TIMEOUT_VAR: &str = "CRUD_STORE_API_TIMEOUT_SECS";

/// Errors raised while building a [`LoopbackConfig`] or its HTTP client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Missing {0} environment variable")]
    MissingEnv(&'static str),

    /// The timeout is not a whole number of seconds
    #[error("Invalid timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),

    /// The base URL does not parse or cannot take path segments
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A default header has an invalid name or value
    #[error("Invalid header {0:?}")]
    InvalidHeader(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Settings for one REST resource.
///
/// # Example
///
/// ```
/// use crud_store_loopback::LoopbackConfig;
/// use std::time::Duration;
///
/// let config = LoopbackConfig::new("http://localhost:3000/api/users")
///     .with_timeout(Duration::from_secs(5))
///     .with_header("authorization", "Bearer token");
///
/// assert_eq!(config.base_url, "http://localhost:3000/api/users");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackConfig {
    /// Collection URL, e.g. `http://host/api/users`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Headers sent with every request
    pub headers: Vec<(String, String)>,
}

impl LoopbackConfig {
    /// Default per-request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Settings for `base_url` with the default timeout and no headers.
    ///
    /// A trailing slash is dropped.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            headers: Vec::new(),
        }
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Read settings from `CRUD_STORE_API_URL` and the optional
    /// `CRUD_STORE_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] if the URL is not set and
    /// [`ConfigError::InvalidTimeout`] if the timeout does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(API_URL_VAR).ok_or(ConfigError::MissingEnv(API_URL_VAR))?;
        let mut config = Self::new(base_url);

        if let Some(raw) = lookup(API_TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn trailing_slash_is_dropped() {
        assert_eq!(LoopbackConfig::new("http://api/users/").base_url, "http://api/users");
    }

    #[test]
    fn from_env_requires_url() {
        assert_eq!(
            LoopbackConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingEnv(API_URL_VAR))
        );
    }

    #[test]
    fn from_env_reads_timeout() {
        let config = LoopbackConfig::from_lookup(lookup(&[
            (API_URL_VAR, "http://api/users"),
            (API_TIMEOUT_VAR, "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://api/users");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn from_env_defaults_timeout() {
        let config = LoopbackConfig::from_lookup(lookup(&[(API_URL_VAR, "http://api")])).unwrap();
        assert_eq!(config.timeout, LoopbackConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn from_env_rejects_bad_timeout() {
        assert_eq!(
            LoopbackConfig::from_lookup(lookup(&[
                (API_URL_VAR, "http://api"),
                (API_TIMEOUT_VAR, "soon"),
            ])),
            Err(ConfigError::InvalidTimeout("soon".into()))
        );
    }
}
