//! The `{data, meta}` envelope wrapped around every request and response body.

use serde::{Deserialize, Serialize};

/// Request body envelope: `{"data": <payload>}`.
#[derive(Debug, Clone, Serialize)]
pub struct Payload<T> {
    pub data: T,
}

impl<T> Payload<T> {
    /// Wraps `data` in the request envelope.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Response body envelope.
///
/// Single resources decode as `ResponsePayload<T>`; lists decode as
/// `ResponsePayload<Vec<T>>` and carry `meta`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePayload<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

/// Pagination cursor of a list response.
///
/// A non-empty `after` means more pages exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    /// Token for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    /// Token for the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,

    /// Maximum number of items per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListMeta {
    /// Returns `true` if another page can be fetched.
    pub fn has_more(&self) -> bool {
        self.after.as_deref().is_some_and(|after| !after.is_empty())
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct List<T> {
    pub meta: ListMeta,
    pub items: Vec<T>,
    /// The `x-request-id` of the response this page came from.
    pub request_id: Option<String>,
}

impl<T> List<T> {
    /// Builds a page from its metadata and items.
    pub fn new(meta: ListMeta, items: Vec<T>) -> Self {
        Self {
            meta,
            items,
            request_id: None,
        }
    }

    /// Attaches the request id of the response the page came from.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

impl<T> From<ResponsePayload<Vec<T>>> for List<T> {
    fn from(payload: ResponsePayload<Vec<T>>) -> Self {
        List::new(payload.meta.unwrap_or_default(), payload.data)
    }
}
