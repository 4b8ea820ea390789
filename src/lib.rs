//! # duffel - A typed client for the Duffel flight-booking API
//!
//! `duffel` wraps the Duffel REST API in typed endpoint methods built on `reqwest`.
//! Every call goes through one pipeline: a rate limiter driven by the server's own
//! `Ratelimit-*` headers, an optional backoff retrier, the `{data, meta}` envelope
//! codec, and a 90 second deadline that no call can exceed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use duffel::{Client, ListAirportsParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), duffel::Error> {
//!     let client = Client::new("duffel_test_123")?;
//!
//!     // A single resource
//!     let airline = client.get_airline("arl_00001876aqC8c5umZmrRds").await?;
//!     println!("{}", airline.name);
//!
//!     // A paginated list, fetched page by page as it is consumed
//!     let mut airports = client
//!         .list_airports(Some(ListAirportsParams {
//!             iata_country_code: Some("FR".to_string()),
//!         }))
//!         .await;
//!     while airports.advance().await {
//!         if let Some(airport) = airports.current() {
//!             println!("{} {}", airport.iata_code, airport.name);
//!         }
//!     }
//!     if let Some(err) = airports.err() {
//!         eprintln!("listing stopped: {}", err);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Server-driven rate limiting** - The token bucket is reconfigured from every response
//! - **Lazy pagination** - [`Iter`] fetches the next page only when the current one is drained
//! - **Structured errors** - API errors keep their request id, `type`, `code` and retryability
//! - **Optional retries** - Exponential backoff with pluggable wait functions and predicates
//! - **Deadlines and cancellation** - Every call is bounded, and can be abandoned with a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Automatic logging** - Structured logging with `tracing`, plus a redacted debug dump
//!
//! ## Error Handling
//!
//! ```no_run
//! use duffel::{Client, Error, ErrorCode};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::new("duffel_test_123")?;
//! match client.get_offer("off_0000AEdGRhtp5AUUdJqMxo", None).await {
//!     Ok(offer) => println!("{} {}", offer.total_amount, offer.total_currency),
//!     Err(e) if e.is_code(&ErrorCode::OfferNoLongerAvailable) => {
//!         eprintln!("offer expired, search again");
//!     }
//!     Err(Error::RateLimitExceeded { period, limit }) => {
//!         eprintln!("{} requests per {:?} exceeded", limit, period);
//!     }
//!     Err(e) => {
//!         eprintln!("failed (request id {:?}): {}", e.request_id(), e);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Retry Strategies
//!
//! ```no_run
//! use duffel::{Client, RetryPolicy, retry::{RetryOnRetryable, RetryOnTimeout}};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), duffel::Error> {
//! let client = Client::builder()
//!     .api_token("duffel_test_123")
//!     .retry_policy(
//!         RetryPolicy::new(5, Duration::from_millis(100), Duration::from_secs(30))
//!             .condition(RetryOnRetryable)
//!             .condition(RetryOnTimeout),
//!     )
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod envelope;
mod error;
mod iter;
pub mod metadata;
pub mod rate_limit;
mod request;
pub mod resources;
mod response;
pub mod retry;

pub use client::{Client, ClientBuilder, VERSION_HEADER};
pub use config::Config;
pub use envelope::{List, ListMeta, Payload, ResponsePayload};
pub use error::{ApiError, ApiErrorDetail, Error, ErrorCode, ErrorMeta, ErrorType, Result};
pub use iter::{Iter, PageFn};
pub use metadata::{ParamEncoder, QueryParams};
pub use rate_limit::{RateLimit, RateLimitConfig};
pub use request::RequestBuilder;
pub use resources::*;
pub use response::{RawResponse, REQUEST_ID_HEADER};
pub use retry::{RetryPolicy, RetryPredicate};
