//! Error types for Duffel API calls.
//!
//! Every failure a call can produce is a variant of [`Error`]. Errors reported by the
//! API itself are decoded from the error envelope into an [`ApiError`], which keeps the
//! request id, the machine-readable `type`/`code` of each entry and whether the call is
//! safe to retry.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The main error type for Duffel API calls.
///
/// # Examples
///
/// ```no_run
/// use duffel::{Client, Error, ErrorCode};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new("duffel_test_123")?;
///
/// match client.get_airport("arp_lhr_gb").await {
///     Ok(airport) => println!("{}", airport.name),
///     Err(Error::Api(err)) if err.is_code(&ErrorCode::NotFound) => {
///         eprintln!("no such airport (request {})", err.request_id());
///     }
///     Err(Error::RateLimitExceeded { period, .. }) => {
///         eprintln!("slow down, window resets in {:?}", period);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No API token was configured. Nothing was sent.
    #[error("duffel: missing API token")]
    MissingCredential,

    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The call did not complete before its deadline.
    #[error("Request timed out")]
    Timeout,

    /// The caller cancelled the call.
    #[error("Request cancelled")]
    Cancelled,

    /// The remote quota is exhausted, either because the server answered with
    /// `429 Too Many Requests` or because `Ratelimit-Remaining` dropped to zero.
    #[error("rate limit exceeded, reset in: {period:?}, current limit: {limit}")]
    RateLimitExceeded {
        /// Length of the current rate window.
        period: Duration,
        /// Requests allowed per window.
        limit: u32,
    },

    /// The API answered with a structured error envelope.
    #[error(transparent)]
    Api(Box<ApiError>),

    /// Failed to deserialize the response body into the expected type.
    ///
    /// This error preserves both the raw response text and the serde error message.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The response declared `Content-Encoding: gzip` but the body could not be inflated.
    #[error("Failed to decompress response body: {0}")]
    Decompression(#[source] std::io::Error),

    /// A response lacked usable `Ratelimit-*` or `Date` headers.
    #[error("Invalid rate limit headers: {0}")]
    InvalidRateLimit(String),

    /// A local precondition failed. Nothing was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if this error is potentially retryable.
    ///
    /// Network errors, timeouts and rate-limit rejections are retryable. Structured API
    /// errors defer to the flag computed when the envelope was decoded.
    ///
    /// # Examples
    ///
    /// ```
    /// use duffel::Error;
    /// use std::time::Duration;
    ///
    /// assert!(Error::Timeout.is_retryable());
    /// assert!(Error::RateLimitExceeded { period: Duration::from_secs(60), limit: 5 }.is_retryable());
    /// assert!(!Error::MissingCredential.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Timeout => true,
            Error::RateLimitExceeded { .. } => true,
            Error::Api(err) => err.retryable,
            Error::Cancelled
            | Error::MissingCredential
            | Error::DeserializationFailed { .. }
            | Error::Decompression(_)
            | Error::InvalidRateLimit(_)
            | Error::Validation(_)
            | Error::ConfigurationError(_)
            | Error::SerializationFailed(_)
            | Error::InvalidUrl(_) => false,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api(err) => Some(err.status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::RateLimitExceeded { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the structured API error, if the server sent one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Returns the request id to quote when contacting Duffel support.
    pub fn request_id(&self) -> Option<&str> {
        self.api_error()
            .map(ApiError::request_id)
            .filter(|id| !id.is_empty())
    }

    /// Returns `true` if this is an API error carrying the given code.
    pub fn is_code(&self, code: &ErrorCode) -> bool {
        self.api_error().is_some_and(|err| err.is_code(code))
    }

    /// Returns `true` if this is an API error carrying the given type.
    pub fn is_type(&self, kind: &ErrorType) -> bool {
        self.api_error().is_some_and(|err| err.is_type(kind))
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(Box::new(err))
    }
}

/// A decoded API error envelope.
///
/// ```json
/// {"meta": {"status": 400, "request_id": "FZW0H3HdJwKk5HMAAKxB"},
///  "errors": [{"type": "airline_error", "code": "airline_unknown", ...}]}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Envelope metadata.
    pub meta: ErrorMeta,
    /// Individual errors, in the order the server listed them.
    pub errors: Vec<ApiErrorDetail>,
    /// Whether repeating the call is safe.
    pub retryable: bool,
}

impl ApiError {
    /// The request id reported by the server, empty if none was sent.
    pub fn request_id(&self) -> &str {
        &self.meta.request_id
    }

    /// Returns `true` if any entry carries the given type.
    pub fn is_type(&self, kind: &ErrorType) -> bool {
        self.errors.iter().any(|e| &e.kind == kind)
    }

    /// Returns `true` if any entry carries the given code.
    pub fn is_code(&self, code: &ErrorCode) -> bool {
        self.errors.iter().any(|e| &e.code == code)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.first() {
            Some(first) => write!(f, "duffel: {}", first.message),
            None => write!(f, "duffel: HTTP {}", self.status),
        }
    }
}

impl std::error::Error for ApiError {}

/// `meta` block of the error envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMeta {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub request_id: String,
}

/// One entry of the `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type", default)]
    pub kind: ErrorType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub documentation_url: String,
    #[serde(default)]
    pub code: ErrorCode,
}

/// Declares a string-backed enum whose unknown values are kept verbatim in `Other`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// A value this crate does not know about yet.
            Other(String),
        }

        impl $name {
            /// The wire representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $value, )*
                    Self::Other(value) => value,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $( $value => Self::$variant, )*
                    _ => Self::Other(value),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::Other(String::new())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                match value {
                    $name::Other(value) => value,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Broad category of an API error.
    pub enum ErrorType {
        AuthenticationError => "authentication_error",
        AirlineError => "airline_error",
        InvalidStateError => "invalid_state_error",
        RateLimitError => "rate_limit_error",
        ValidationError => "validation_error",
        InvalidRequestError => "invalid_request_error",
        ApiError => "api_error",
    }
}

string_enum! {
    /// Machine-readable error code.
    pub enum ErrorCode {
        /// The access token used is not recognized.
        AccessTokenNotFound => "access_token_not_found",
        /// The airline responded with an internal error.
        AirlineInternal => "airline_internal",
        /// The airline responded with an unexpected error.
        AirlineUnknown => "airline_unknown",
        AncillaryServiceNotAvailable => "ancillary_service_not_available",
        AlreadyCancelled => "already_cancelled",
        BadRequest => "bad_request",
        /// A booking with the same details already exists for the itinerary.
        DuplicateBooking => "duplicate_booking",
        DuplicatePassengerName => "duplicate_passenger_name",
        ExpiredAccessToken => "expired_access_token",
        InsufficientBalance => "insufficient_balance",
        InsufficientPermissions => "insufficient_permissions",
        InternalServerError => "internal_server_error",
        InvalidAuthorizationHeader => "invalid_authorization_header",
        InvalidContentTypeHeader => "invalid_content_type_header",
        InvalidDataParam => "invalid_data_param",
        InvalidLoyaltyCard => "invalid_loyalty_card",
        InvalidVersionHeader => "invalid_version_header",
        MalformedDataParam => "malformed_data_param",
        MissingAuthorizationHeader => "missing_authorization_header",
        MissingContentTypeHeader => "missing_content_type_header",
        MissingDataParam => "missing_data_param",
        MissingVersionHeader => "missing_version_header",
        NotFound => "not_found",
        OfferNoLongerAvailable => "offer_no_longer_available",
        RateLimitExceeded => "rate_limit_exceeded",
        UnavailableFeature => "unavailable_feature",
        UnsupportedAction => "unsupported_action",
        UnsupportedFormat => "unsupported_format",
        UnsupportedVersion => "unsupported_version",
    }
}

/// A specialized `Result` type for Duffel API calls.
pub type Result<T> = std::result::Result<T, Error>;
