//! The Duffel API client.
//!
//! [`Client`] owns the connection pool, the credentials and the state shared by every
//! call made through it: the rate limiter and the last request id. Resource methods
//! (`list_airports`, `create_order`, ...) live next to their types in
//! [`resources`](crate::resources); anything else can be reached through
//! [`Client::request`].

use crate::{
    config::{non_empty_var, Config, MAX_CALL_DURATION},
    error::{ApiError, ApiErrorDetail, ErrorCode, ErrorMeta, ErrorType},
    metadata::RequestMetadata,
    rate_limit::{RateLimit, RateLimitConfig, RateLimiter},
    request::RequestBuilder,
    retry::RetryPolicy,
    Error, RawResponse, Result,
};
use http::{header, HeaderValue, Method, StatusCode};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use url::Url;

/// Header selecting the API version.
pub const VERSION_HEADER: &str = "Duffel-Version";

/// Paths under which a 500 may mean the airline booked anyway; never retried.
const ORDERS_PATH: &str = "/air/orders";

/// A Duffel API client.
///
/// The client is designed to be reused across multiple requests. Clones share the
/// connection pool, the rate limiter and the last request id.
///
/// # Examples
///
/// ```no_run
/// use duffel::{Client, ListAirportsParams};
///
/// # async fn example() -> Result<(), duffel::Error> {
/// let client = Client::new("duffel_test_123")?;
///
/// let airport = client.get_airport("arp_lhr_gb").await?;
/// println!("{} ({})", airport.name, airport.iata_code);
///
/// let mut airports = client
///     .list_airports(Some(ListAirportsParams {
///         iata_country_code: Some("GB".to_string()),
///     }))
///     .await;
/// while airports.advance().await {
///     if let Some(airport) = airports.current() {
///         println!("{}", airport.name);
///     }
/// }
/// if let Some(err) = airports.err() {
///     eprintln!("listing failed: {}", err);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    api_token: String,
    host: Url,
    version: String,
    user_agent: String,
    debug: bool,
    retry: Option<RetryPolicy>,
    timeout: Duration,
    limiter: RateLimiter,
    last_request_id: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    meta: ErrorMeta,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

impl Client {
    /// Creates a client for the production API with default settings.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_config(api_token, Config::default())
    }

    /// Creates a client from an explicit configuration record.
    pub fn with_config(api_token: impl Into<String>, config: Config) -> Result<Self> {
        let http_client = match config.http_client {
            Some(client) => client,
            None => reqwest::Client::builder().build().map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?,
        };

        HeaderValue::try_from(config.version.as_str())
            .map_err(|e| Error::ConfigurationError(format!("Invalid version: {}", e)))?;
        HeaderValue::try_from(config.user_agent.as_str())
            .map_err(|e| Error::ConfigurationError(format!("Invalid user agent: {}", e)))?;

        let retry = config.retry.filter(RetryPolicy::is_enabled);

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                api_token: api_token.into(),
                host: config.host,
                version: config.version,
                user_agent: config.user_agent,
                debug: config.debug,
                retry,
                timeout: config.timeout.min(MAX_CALL_DURATION),
                limiter: RateLimiter::new(&config.rate_limit),
                last_request_id: RwLock::new(None),
            }),
        })
    }

    /// Creates a client from `DUFFEL_TOKEN`, honouring `DUFFEL_HOST` and `DUFFEL_VERSION`.
    pub fn from_env() -> Result<Self> {
        let api_token = non_empty_var("DUFFEL_TOKEN").ok_or(Error::MissingCredential)?;
        Self::with_config(api_token, Config::from_env()?)
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use duffel::Client;
    ///
    /// # fn example() -> Result<(), duffel::Error> {
    /// let client = Client::builder()
    ///     .api_token("duffel_test_123")
    ///     .version("v2")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Starts describing a call with request body type `Req` and response type `Resp`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use duffel::{Airline, Client};
    ///
    /// # async fn example() -> Result<(), duffel::Error> {
    /// let client = Client::new("duffel_test_123")?;
    /// let airline = client
    ///     .request::<(), Airline>()
    ///     .get("/air/airlines/arl_00001876aqC8c5umZmrRds")
    ///     .one()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn request<Req, Resp>(&self) -> RequestBuilder<Req, Resp> {
        RequestBuilder::new(self.clone(), self.inner.timeout)
    }

    /// The `x-request-id` of the most recent response received through this client.
    pub fn last_request_id(&self) -> Option<String> {
        self.inner
            .last_request_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent quota reported by the server.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.inner.limiter.last()
    }

    /// Sends one logical request, retrying according to the configured policy.
    ///
    /// Each attempt waits for a rate-limit token first. The serialized body is kept
    /// as bytes so every attempt sends an identical copy.
    pub(crate) async fn execute(
        &self,
        metadata: &RequestMetadata,
        body: Option<&[u8]>,
    ) -> Result<RawResponse> {
        if self.inner.api_token.is_empty() {
            return Err(Error::MissingCredential);
        }

        let url = self.build_url(metadata)?;
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            self.inner.limiter.acquire().await;
            let outcome = self.execute_request(metadata, &url, body, attempt).await;

            if let Err(e) = &outcome {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    method = %metadata.method,
                    path = %metadata.path,
                    "Request failed"
                );
            }

            let delay = match &self.inner.retry {
                Some(policy) if policy.should_retry(&outcome, attempt) => {
                    let delay = policy.delay_for_attempt(attempt as u32);
                    if delay.is_none() {
                        tracing::warn!(attempts = attempt, "Retries exhausted");
                    }
                    delay
                }
                _ => None,
            };

            let Some(delay) = delay else {
                return outcome.map(|mut response| {
                    response.latency = start_time.elapsed();
                    response.attempts = attempt;
                    response
                });
            };

            tracing::info!(
                delay_ms = delay.as_millis(),
                attempt = attempt,
                "Retrying request after delay"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn build_url(&self, metadata: &RequestMetadata) -> Result<Url> {
        let mut url = self.inner.host.clone();
        url.set_path(&metadata.path);

        if !metadata.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in metadata.query.iter() {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Executes a single request attempt.
    async fn execute_request(
        &self,
        metadata: &RequestMetadata,
        url: &Url,
        body: Option<&[u8]>,
        attempt: usize,
    ) -> Result<RawResponse> {
        tracing::debug!(
            method = %metadata.method,
            url = %url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let inner = &self.inner;
        let mut request = inner
            .http_client
            .request(metadata.method.clone(), url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, inner.user_agent.as_str())
            .header(VERSION_HEADER, inner.version.as_str())
            .bearer_auth(&inner.api_token);

        if !inner.debug {
            request = request.header(header::ACCEPT_ENCODING, "gzip");
        }

        if metadata.method != Method::GET {
            if let Some(body) = body {
                request = request.body(body.to_vec());
            }
        }

        let mut request = request.build()?;
        for hook in &metadata.hooks {
            hook(&mut request)?;
        }

        if inner.debug {
            dump_request(&request);
        }

        let sent_at = Instant::now();
        let response = inner
            .http_client
            .execute(request)
            .await
            .map_err(transport_error)?;
        let response = RawResponse::read(response, sent_at.elapsed()).await?;

        tracing::info!(
            status = response.status.as_u16(),
            latency_ms = response.latency.as_millis(),
            attempt = attempt,
            request_id = response.request_id.as_deref().unwrap_or(""),
            "Received HTTP response"
        );

        if inner.debug {
            dump_response(&response);
        }

        if let Some(request_id) = &response.request_id {
            let mut last = inner
                .last_request_id
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *last = Some(request_id.clone());
        }

        if response.status == StatusCode::TOO_MANY_REQUESTS {
            if let Ok(rate_limit) = RateLimit::from_headers(&response.headers) {
                inner.limiter.update(&rate_limit).await;
                return Err(rate_limit_exceeded(&rate_limit));
            }
        }

        if response.status.as_u16() >= 400 {
            return Err(decode_error(&response, url.path()));
        }

        let rate_limit = RateLimit::from_headers(&response.headers)?;
        inner.limiter.update(&rate_limit).await;

        if rate_limit.is_exhausted() {
            return Err(rate_limit_exceeded(&rate_limit));
        }

        Ok(response)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(e)
    }
}

fn rate_limit_exceeded(rate_limit: &RateLimit) -> Error {
    tracing::warn!(
        limit = rate_limit.limit,
        period_ms = rate_limit.period.as_millis(),
        "Rate limit exceeded"
    );
    Error::RateLimitExceeded {
        period: rate_limit.period,
        limit: rate_limit.limit,
    }
}

/// Whether repeating a call that failed with `status` on `path` is safe.
///
/// Server errors are retryable except a 500 on an orders path: the airline may have
/// booked the order anyway. Client errors other than 429 are not.
pub(crate) fn is_retryable_status(status: StatusCode, path: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    if status == StatusCode::INTERNAL_SERVER_ERROR && path.starts_with(ORDERS_PATH) {
        return false;
    }
    status.is_server_error()
}

/// Maps a non-2xx response to an error.
fn decode_error(response: &RawResponse, path: &str) -> Error {
    let status = response.status;

    if status.is_client_error() {
        tracing::error!(status = status.as_u16(), response = %response.text(), "Client error (4xx)");
    } else {
        tracing::warn!(status = status.as_u16(), response = %response.text(), "Server error (5xx)");
    }

    // Routing layers answer with HTML pages that are not envelopes.
    if response.has_content_type("text/html") {
        return Error::from(ApiError {
            status,
            meta: ErrorMeta {
                status: i64::from(status.as_u16()),
                request_id: response.request_id.clone().unwrap_or_default(),
            },
            errors: vec![ApiErrorDetail {
                kind: ErrorType::ApiError,
                title: status.canonical_reason().unwrap_or("Error").to_string(),
                message: "An internal server error occurred. Please try again later.".to_string(),
                documentation_url: String::new(),
                code: ErrorCode::InternalServerError,
            }],
            retryable: true,
        });
    }

    let envelope = match response.decode::<ErrorEnvelope>() {
        Ok(envelope) => envelope,
        Err(e) => return e,
    };

    let mut meta = envelope.meta;
    if meta.request_id.is_empty() {
        meta.request_id = response.request_id.clone().unwrap_or_default();
    }

    Error::from(ApiError {
        status,
        meta,
        errors: envelope.errors,
        retryable: is_retryable_status(status, path),
    })
}

fn dump_request(request: &reqwest::Request) {
    let headers: Vec<String> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            if *name == header::AUTHORIZATION {
                format!("{}: Bearer <redacted>", name)
            } else {
                format!("{}: {}", name, value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect();
    let body = request
        .body()
        .and_then(|b| b.as_bytes())
        .map(String::from_utf8_lossy)
        .unwrap_or_default();

    tracing::info!(
        method = %request.method(),
        url = %request.url(),
        headers = ?headers,
        body = %body,
        "REQUEST"
    );
}

fn dump_response(response: &RawResponse) {
    let headers: Vec<String> = response
        .headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect();

    tracing::info!(
        status = response.status.as_u16(),
        headers = ?headers,
        body = %response.text(),
        "RESPONSE"
    );
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use duffel::{ClientBuilder, RetryPolicy, retry::RetryOnRetryable};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), duffel::Error> {
/// let client = ClientBuilder::new()
///     .api_token("duffel_test_123")
///     .base_url("https://api.duffel.com")?
///     .timeout(Duration::from_secs(30))
///     .retry_policy(
///         RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(10))
///             .condition(RetryOnRetryable),
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    api_token: Option<String>,
    config: Config,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API token sent as a bearer credential.
    pub fn api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    /// Sets the base URL for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.config.host = Url::parse(url.as_ref())?;
        Ok(self)
    }

    /// Sets the `Duffel-Version` header.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Sets the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Uses an existing HTTP client, for custom transports or proxies.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.config.http_client = Some(client);
        self
    }

    /// Dumps every request and response. Do not use in production.
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Sets the default per-call deadline. Values above 90 seconds are capped.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Enables backoff retries.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = Some(policy);
        self
    }

    /// Sets the limiter settings used before the first response.
    pub fn rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// A missing token is not an error here; calls fail with
    /// [`Error::MissingCredential`] instead.
    pub fn build(self) -> Result<Client> {
        Client::with_config(self.api_token.unwrap_or_default(), self.config)
    }
}
