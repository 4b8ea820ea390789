//! Rate limiting driven by the server's own quota headers.
//!
//! Every response carries `Ratelimit-Limit`, `Ratelimit-Remaining`, `Ratelimit-Reset`
//! and `Date`. [`RateLimit::from_headers`] turns those into a [`RateLimit`], and the
//! client's [`RateLimiter`] is reconfigured from it so the next requests are paced to
//! what the server says it will accept.

use crate::{Error, Result};
use http::HeaderMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Quota state reported by the server on a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the current window ends.
    pub reset_at: SystemTime,
    /// `reset_at` minus the server's `Date`. Zero when the reset is not in the future.
    pub period: Duration,
}

impl RateLimit {
    /// Parses the quota headers of a response.
    ///
    /// All four headers are required; a missing or malformed one is an error because
    /// the limiter cannot be trusted without them.
    ///
    /// # Examples
    ///
    /// ```
    /// use duffel::rate_limit::RateLimit;
    /// use http::HeaderMap;
    /// use std::time::Duration;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("ratelimit-limit", "60".parse().unwrap());
    /// headers.insert("ratelimit-remaining", "59".parse().unwrap());
    /// headers.insert("ratelimit-reset", "Sun, 06 Nov 1994 08:49:37 GMT".parse().unwrap());
    /// headers.insert("date", "Sun, 06 Nov 1994 08:48:37 GMT".parse().unwrap());
    ///
    /// let rate_limit = RateLimit::from_headers(&headers).unwrap();
    /// assert_eq!(rate_limit.period, Duration::from_secs(60));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let limit = parse_count(headers, "ratelimit-limit")?;
        let remaining = parse_count(headers, "ratelimit-remaining")?;
        let reset_at = parse_date(headers, "ratelimit-reset")?;
        let server_now = parse_date(headers, "date")?;

        let period = reset_at
            .duration_since(server_now)
            .unwrap_or(Duration::ZERO);

        Ok(Self {
            limit,
            remaining,
            reset_at,
            period,
        })
    }

    /// Returns `true` if no requests are left in the current window.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Time between two refilled tokens: the window spread evenly over the limit.
    ///
    /// Sub-nanosecond remainders are truncated.
    pub fn refill_interval(&self) -> Duration {
        if self.limit == 0 {
            return self.period;
        }
        self.period / self.limit
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .ok_or_else(|| Error::InvalidRateLimit(format!("missing {} header", name)))?
        .to_str()
        .map_err(|e| Error::InvalidRateLimit(format!("{} header is not text: {}", name, e)))
}

fn parse_count(headers: &HeaderMap, name: &str) -> Result<u32> {
    let value = header_str(headers, name)?;
    value
        .trim()
        .parse()
        .map_err(|e| Error::InvalidRateLimit(format!("{} header {:?}: {}", name, value, e)))
}

fn parse_date(headers: &HeaderMap, name: &str) -> Result<SystemTime> {
    let value = header_str(headers, name)?;
    httpdate::parse_http_date(value)
        .map_err(|e| Error::InvalidRateLimit(format!("{} header {:?}: {}", name, value, e)))
}

/// Limiter settings used until the first response reports the real quota.
///
/// # Examples
///
/// ```
/// use duffel::rate_limit::RateLimitConfig;
/// use std::time::Duration;
///
/// let config = RateLimitConfig::builder()
///     .burst(10)
///     .interval(Duration::from_millis(200))
///     .build();
/// assert_eq!(config.burst, 10);
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Tokens available before any response has been seen.
    pub burst: u32,

    /// Time to refill one token before any response has been seen.
    pub interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 5,
            interval: Duration::from_secs(1),
        }
    }
}

impl RateLimitConfig {
    /// Creates a new builder for the initial limiter settings.
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::default()
    }
}

/// Builder for `RateLimitConfig`.
#[derive(Default)]
pub struct RateLimitConfigBuilder {
    burst: Option<u32>,
    interval: Option<Duration>,
}

impl RateLimitConfigBuilder {
    /// Sets the initial burst.
    pub fn burst(mut self, burst: u32) -> Self {
        self.burst = Some(burst);
        self
    }

    /// Sets the initial refill interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Builds the `RateLimitConfig`.
    pub fn build(self) -> RateLimitConfig {
        let default = RateLimitConfig::default();
        RateLimitConfig {
            burst: self.burst.unwrap_or(default.burst),
            interval: self.interval.unwrap_or(default.interval),
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    burst: u32,
    interval: Duration,
    refilled_at: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        let capacity = f64::from(self.burst.max(1));
        if self.interval.is_zero() {
            self.tokens = capacity;
        } else {
            let elapsed = now.duration_since(self.refilled_at).as_secs_f64();
            self.tokens = (self.tokens + elapsed / self.interval.as_secs_f64()).min(capacity);
        }
        self.refilled_at = now;
    }
}

/// Token bucket shared by every call issued through one client.
///
/// The bucket is held behind a tokio mutex that is only locked while tokens are
/// counted; waiting for a token happens with the lock released.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    last: RwLock<Option<RateLimit>>,
}

impl RateLimiter {
    /// Creates a full bucket from the initial settings.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: f64::from(config.burst.max(1)),
                burst: config.burst,
                interval: config.interval,
                refilled_at: Instant::now(),
            }),
            last: RwLock::new(None),
        }
    }

    /// Waits until a token is available, then takes it.
    ///
    /// Dropping the returned future abandons the wait.
    pub async fn acquire(&self) {
        loop {
            let mut bucket = self.bucket.lock().await;
            bucket.refill(Instant::now());

            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                return;
            }

            let wait = bucket.interval.mul_f64(1.0 - bucket.tokens);
            drop(bucket);

            tracing::debug!(wait_ms = wait.as_millis(), "Waiting for rate limit token");
            sleep(wait).await;
        }
    }

    /// Reconfigures the bucket from the quota the server just reported.
    pub async fn update(&self, rate_limit: &RateLimit) {
        {
            let mut bucket = self.bucket.lock().await;
            bucket.refill(Instant::now());
            bucket.burst = rate_limit.limit;
            bucket.interval = rate_limit.refill_interval();
            bucket.tokens = bucket.tokens.min(f64::from(rate_limit.limit.max(1)));
        }

        let mut last = self.last.write().unwrap_or_else(|e| e.into_inner());
        *last = Some(rate_limit.clone());
    }

    /// The most recent quota reported by the server, if any.
    pub fn last(&self) -> Option<RateLimit> {
        self.last.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimitConfig::default())
    }
}
