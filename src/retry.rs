//! Backoff policy and retry predicates for handling transient failures.
//!
//! A [`RetryPolicy`] wraps a single logical request: after each attempt its predicates
//! look at the outcome, and if any of them asks for a retry the client sleeps for the
//! policy's wait duration and sends the request again. A policy without predicates never
//! retries.

use crate::{Error, RawResponse, Result};
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Computes the wait before a retry from the retry number (1-indexed) and the
/// policy's minimum and maximum waits.
pub type WaitFn = fn(attempt: u32, min: Duration, max: Duration) -> Duration;

/// Exponential backoff: `min * 2^attempt` plus up to `min * attempt` of jitter,
/// capped at `max`.
///
/// # Examples
///
/// ```
/// use duffel::retry::exponential_backoff;
/// use std::time::Duration;
///
/// let wait = exponential_backoff(1, Duration::from_millis(100), Duration::from_secs(10));
/// assert!(wait >= Duration::from_millis(200));
/// assert!(wait <= Duration::from_millis(300));
/// ```
pub fn exponential_backoff(attempt: u32, min: Duration, max: Duration) -> Duration {
    const FACTOR: f64 = 2.0;

    let delay = min.as_secs_f64() * FACTOR.powi(attempt.min(i32::MAX as u32) as i32);
    let jitter = rand::thread_rng().gen_range(0.0..=1.0) * min.as_secs_f64() * f64::from(attempt);

    let total = delay + jitter;
    if !total.is_finite() || total >= max.as_secs_f64() {
        return max;
    }
    Duration::from_secs_f64(total)
}

/// Waits `min` before every retry.
pub fn constant_backoff(_attempt: u32, min: Duration, _max: Duration) -> Duration {
    min
}

/// Bounded backoff around one request.
///
/// # Examples
///
/// ```
/// use duffel::retry::{RetryOn5xx, RetryOnTimeout, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(5))
///     .condition(RetryOn5xx)
///     .condition(RetryOnTimeout);
///
/// assert!(policy.is_enabled());
/// assert_eq!(policy.delay_for_attempt(4), None);
/// ```
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_attempts: u32,
    /// Smallest wait between attempts.
    pub min_wait: Duration,
    /// Largest wait between attempts.
    pub max_wait: Duration,
    /// How long to wait before each retry.
    pub wait_fn: WaitFn,
    /// A retry happens if any of these ask for one.
    pub conditions: Vec<Box<dyn RetryPredicate>>,
}

impl RetryPolicy {
    /// Creates a policy with exponential backoff and no conditions.
    pub fn new(max_attempts: u32, min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_attempts,
            min_wait,
            max_wait,
            wait_fn: exponential_backoff,
            conditions: Vec::new(),
        }
    }

    /// Replaces the wait function.
    pub fn wait_fn(mut self, wait_fn: WaitFn) -> Self {
        self.wait_fn = wait_fn;
        self
    }

    /// Adds a retry condition.
    pub fn condition(mut self, predicate: impl RetryPredicate + 'static) -> Self {
        self.conditions.push(Box::new(predicate));
        self
    }

    /// Returns `false` if no condition is configured, in which case the policy never retries.
    pub fn is_enabled(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Returns the wait before the given retry, or `None` once retries are exhausted.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry number (1-indexed, so 1 = first retry)
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some((self.wait_fn)(attempt, self.min_wait, self.max_wait).min(self.max_wait))
    }

    /// Asks every condition whether this outcome deserves another attempt.
    pub fn should_retry(&self, outcome: &Result<RawResponse>, attempt: usize) -> bool {
        match outcome {
            Ok(response) => self
                .conditions
                .iter()
                .any(|p| p.should_retry_response(response, attempt)),
            Err(error) => self
                .conditions
                .iter()
                .any(|p| p.should_retry(error, attempt)),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("min_wait", &self.min_wait)
            .field("max_wait", &self.max_wait)
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

/// Trait for determining whether a request should be sent again.
///
/// Any `Fn(&Error, usize) -> bool` closure is a predicate.
///
/// # Examples
///
/// ```
/// use duffel::{Error, RetryPredicate};
///
/// struct RetryOnRateLimit;
///
/// impl RetryPredicate for RetryOnRateLimit {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         matches!(error, Error::RateLimitExceeded { .. })
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Decides based on a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `error` - The error that occurred
    /// * `attempt` - The attempt number (1-indexed)
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;

    /// Decides based on a response that did not fail. Never retries by default.
    fn should_retry_response(&self, _response: &RawResponse, _attempt: usize) -> bool {
        false
    }
}

impl<F> RetryPredicate for F
where
    F: Fn(&Error, usize) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self(error, attempt)
    }
}

/// Retry all errors that are marked as retryable.
///
/// This uses [`Error::is_retryable`], which honours the retryable flag the server's
/// error envelope was decoded with.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retry on 5xx API errors that are marked retryable.
#[derive(Debug, Clone, Copy)]
pub struct RetryOn5xx;

impl RetryPredicate for RetryOn5xx {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Api(err) if err.status.is_server_error() && err.retryable)
    }
}

/// Retry only on timeout errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTimeout;

impl RetryPredicate for RetryOnTimeout {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Timeout)
    }
}

/// Retry only on network/connection errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnConnectionError;

impl RetryPredicate for RetryOnConnectionError {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Network(_))
    }
}

/// Retry when the rate limit was exceeded.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRateLimit;

impl RetryPredicate for RetryOnRateLimit {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::RateLimitExceeded { .. })
    }
}

/// Retry when the response or API error carries one of the given status codes.
#[derive(Debug, Clone)]
pub struct RetryOnStatus(pub Vec<u16>);

impl RetryPredicate for RetryOnStatus {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error
            .status()
            .is_some_and(|status| self.0.contains(&status.as_u16()))
    }

    fn should_retry_response(&self, response: &RawResponse, _attempt: usize) -> bool {
        self.0.contains(&response.status.as_u16())
    }
}

/// Combine multiple retry predicates with OR logic.
///
/// Retries if ANY of the predicates return `true`.
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates a new `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry(error, attempt))
    }

    fn should_retry_response(&self, response: &RawResponse, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry_response(response, attempt))
    }
}

/// Combine multiple retry predicates with AND logic.
///
/// Retries only if ALL of the predicates return `true`.
///
/// # Examples
///
/// ```
/// use duffel::retry::{AndPredicate, RetryOnRetryable};
/// use duffel::Error;
///
/// // Retry retryable errors, but only for the first two attempts
/// let predicate = AndPredicate::new(vec![
///     Box::new(RetryOnRetryable),
///     Box::new(|_: &Error, attempt: usize| attempt <= 2),
/// ]);
/// ```
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Creates a new `AndPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates
            .iter()
            .all(|p| p.should_retry(error, attempt))
    }

    fn should_retry_response(&self, response: &RawResponse, attempt: usize) -> bool {
        self.predicates
            .iter()
            .all(|p| p.should_retry_response(response, attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorMeta};
    use http::{HeaderMap, StatusCode};

    fn api_error(status: StatusCode, retryable: bool) -> Error {
        Error::from(ApiError {
            status,
            meta: ErrorMeta::default(),
            errors: vec![],
            retryable,
        })
    }

    #[test]
    fn test_exponential_backoff_delays() {
        let min = Duration::from_millis(100);
        let max = Duration::from_secs(10);

        for attempt in 1..=5u32 {
            let wait = exponential_backoff(attempt, min, max);
            let base = min * 2u32.pow(attempt);
            assert!(wait >= base, "attempt {}: {:?} < {:?}", attempt, wait, base);
            assert!(wait <= base + min * attempt);
        }

        assert_eq!(exponential_backoff(20, min, max), max);
    }

    #[test]
    fn test_constant_delays() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(5))
            .wait_fn(constant_backoff);

        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(4), None);
    }

    #[test]
    fn test_no_conditions_never_retries() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
        assert!(!policy.is_enabled());
        assert!(!policy.should_retry(&Err(Error::Timeout), 1));
    }

    #[test]
    fn test_any_condition_triggers_retry() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5))
            .condition(RetryOnTimeout)
            .condition(RetryOn5xx);

        assert!(policy.should_retry(&Err(Error::Timeout), 1));
        assert!(policy.should_retry(&Err(api_error(StatusCode::BAD_GATEWAY, true)), 1));
        assert!(!policy.should_retry(&Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, false)), 1));
        assert!(!policy.should_retry(&Err(api_error(StatusCode::NOT_FOUND, false)), 1));
    }

    #[test]
    fn test_status_condition_sees_responses() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(5))
            .condition(RetryOnStatus(vec![202]));

        let accepted = RawResponse::new(
            StatusCode::ACCEPTED,
            HeaderMap::new(),
            Vec::new(),
            Duration::ZERO,
        );
        assert!(policy.should_retry(&Ok(accepted), 1));
    }

    #[test]
    fn test_and_predicate_with_closure() {
        let predicate = AndPredicate::new(vec![
            Box::new(RetryOnRetryable),
            Box::new(|_: &Error, attempt: usize| attempt <= 2),
        ]);

        assert!(predicate.should_retry(&Error::Timeout, 2));
        assert!(!predicate.should_retry(&Error::Timeout, 3));
        assert!(!predicate.should_retry(&Error::MissingCredential, 1));
    }
}
