//! Client configuration.

use crate::rate_limit::RateLimitConfig;
use crate::retry::RetryPolicy;
use crate::Result;
use std::time::Duration;
use url::Url;

/// Production API host.
pub const DEFAULT_HOST: &str = "https://api.duffel.com/";

/// Value of the `Duffel-Version` header unless configured otherwise.
pub const DEFAULT_VERSION: &str = "beta";

/// User agent sent unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("duffel-rs/", env!("CARGO_PKG_VERSION"));

/// Upper bound on the duration of any single call, including rate-limit waits and retries.
pub const MAX_CALL_DURATION: Duration = Duration::from_secs(90);

/// Everything a [`Client`](crate::Client) can be configured with.
///
/// # Examples
///
/// ```
/// use duffel::{Client, Config};
///
/// let config = Config {
///     version: "v2".to_string(),
///     ..Config::default()
/// };
/// let client = Client::with_config("duffel_test_123", config).unwrap();
/// ```
#[derive(Debug)]
pub struct Config {
    /// Sent as the `Duffel-Version` header.
    pub version: String,

    /// Base URL every resource path is resolved against.
    pub host: Url,

    /// Sent as the `User-Agent` header.
    pub user_agent: String,

    /// HTTP client to send requests with. A fresh one is built when `None`.
    pub http_client: Option<reqwest::Client>,

    /// Dump every request and response, and ask for uncompressed bodies.
    pub debug: bool,

    /// Optional backoff around each request.
    pub retry: Option<RetryPolicy>,

    /// Default per-call deadline, never more than [`MAX_CALL_DURATION`].
    pub timeout: Duration,

    /// Limiter settings used until the server reports its quota.
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            host: default_host(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_client: None,
            debug: false,
            retry: None,
            timeout: MAX_CALL_DURATION,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Reads `DUFFEL_HOST` and `DUFFEL_VERSION` over the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = non_empty_var("DUFFEL_HOST") {
            config.host = Url::parse(&host)?;
        }
        if let Some(version) = non_empty_var("DUFFEL_VERSION") {
            config.version = version;
        }
        Ok(config)
    }
}

pub(crate) fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_host() -> Url {
    Url::parse(DEFAULT_HOST).unwrap_or_else(|_| unreachable!("DEFAULT_HOST is a valid URL"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production() {
        let config = Config::default();
        assert_eq!(config.host.as_str(), DEFAULT_HOST);
        assert_eq!(config.version, "beta");
        assert!(config.user_agent.starts_with("duffel-rs/"));
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert!(!config.debug);
        assert!(config.retry.is_none());
    }
}
