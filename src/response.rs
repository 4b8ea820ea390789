//! Raw HTTP responses as handed from the transport to the decoders.
//!
//! The body is read once, inflated if the server gzip-encoded it, and kept as bytes so
//! that both the success path and the error path decode the same buffer.

use crate::{Error, Result};
use flate2::read::GzDecoder;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::io::Read;
use std::time::Duration;

/// Header carrying the server-assigned request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A fully-read HTTP response.
///
/// # Examples
///
/// ```
/// # use duffel::RawResponse;
/// # use http::{HeaderMap, StatusCode};
/// # use std::time::Duration;
/// let response = RawResponse::new(
///     StatusCode::OK,
///     HeaderMap::new(),
///     br#"{"data": 42}"#.to_vec(),
///     Duration::from_millis(12),
/// );
///
/// let payload: serde_json::Value = response.decode().unwrap();
/// assert_eq!(payload["data"], 42);
/// ```
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The decompressed response body.
    pub body: Vec<u8>,

    /// The `x-request-id` header, if the server sent one.
    pub request_id: Option<String>,

    /// Time from the first attempt until this response was read.
    pub latency: Duration,

    /// The number of attempts made to obtain this response.
    pub attempts: usize,
}

impl RawResponse {
    /// Creates a `RawResponse` from already-decompressed parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>, latency: Duration) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            status,
            headers,
            body,
            request_id,
            latency,
            attempts: 1,
        }
    }

    /// Reads a reqwest response to the end, inflating gzip bodies.
    pub(crate) async fn read(response: reqwest::Response, latency: Duration) -> Result<Self> {
        let status = response.status();
        let mut headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let body = if is_gzip(&headers) {
            let body = gunzip(&bytes)?;
            headers.remove(http::header::CONTENT_ENCODING);
            body
        } else {
            bytes.to_vec()
        };

        Ok(Self::new(status, headers, body, latency))
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns `true` if the `Content-Type` starts with the given media type.
    pub fn has_content_type(&self, media_type: &str) -> bool {
        self.header(http::header::CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.trim_start().starts_with(media_type))
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserializes the body as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::error!(
                error = %e,
                status = self.status.as_u16(),
                raw_response = %self.text(),
                "Failed to deserialize response"
            );

            Error::DeserializationFailed {
                raw_response: self.text().into_owned(),
                serde_error: e.to_string(),
                status: self.status,
            }
        })
    }
}

fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"))
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(Error::Decompression)?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use http::HeaderValue;
    use std::io::Write;

    #[test]
    fn gunzip_inflates_body() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"data":"hello"}"#).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(gunzip(&compressed).unwrap(), br#"{"data":"hello"}"#.to_vec());
    }

    #[test]
    fn gunzip_rejects_garbage() {
        assert!(matches!(
            gunzip(b"definitely not gzip"),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn request_id_is_picked_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("FZW0H3HdJwKk5HMAAKxB"));
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );

        let response = RawResponse::new(StatusCode::BAD_GATEWAY, headers, Vec::new(), Duration::ZERO);
        assert_eq!(response.request_id.as_deref(), Some("FZW0H3HdJwKk5HMAAKxB"));
        assert!(response.has_content_type("text/html"));
        assert!(!response.has_content_type("application/json"));
    }

    #[test]
    fn decode_failure_keeps_raw_body() {
        let response = RawResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            b"invalid json".to_vec(),
            Duration::ZERO,
        );

        match response.decode::<serde_json::Value>() {
            Err(Error::DeserializationFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "invalid json");
                assert_eq!(status, StatusCode::OK);
            }
            other => panic!("Expected DeserializationFailed, got {:?}", other),
        }
    }
}
