//! Request descriptors.
//!
//! A [`RequestMetadata`] is everything needed to issue one call except the body:
//! method, resource path, query parameters and request hooks.

use crate::envelope::ListMeta;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// Mutates the built HTTP request just before it is sent.
pub type RequestHook = Arc<dyn Fn(&mut reqwest::Request) -> crate::Result<()> + Send + Sync>;

/// Ordered, multi-valued query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, keeping any existing values for the key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Replaces every value for the key with a single one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove(&key);
        self.pairs.push((key, value.into()));
    }

    /// Removes every value for the key.
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// The first value for the key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for the key, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over all pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of key-value pairs, counting repeated keys.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

/// A value that knows how to write itself into query parameters.
///
/// # Examples
///
/// ```
/// use duffel::metadata::{ParamEncoder, QueryParams};
///
/// struct Search<'a> {
///     query: &'a str,
/// }
///
/// impl ParamEncoder for Search<'_> {
///     fn encode(&self, params: &mut QueryParams) -> duffel::Result<()> {
///         params.set("query", self.query);
///         Ok(())
///     }
/// }
///
/// let mut params = QueryParams::new();
/// Search { query: "lon" }.encode(&mut params).unwrap();
/// assert_eq!(params.get("query"), Some("lon"));
/// ```
pub trait ParamEncoder {
    /// Writes this value's parameters.
    fn encode(&self, params: &mut QueryParams) -> crate::Result<()>;
}

impl<T: ParamEncoder + ?Sized> ParamEncoder for &T {
    fn encode(&self, params: &mut QueryParams) -> crate::Result<()> {
        (**self).encode(params)
    }
}

impl<T: ParamEncoder> ParamEncoder for Option<T> {
    fn encode(&self, params: &mut QueryParams) -> crate::Result<()> {
        match self {
            Some(inner) => inner.encode(params),
            None => Ok(()),
        }
    }
}

/// Metadata for an individual HTTP request.
#[derive(Clone)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The resource path, resolved against the configured host.
    pub path: String,

    /// Query parameters for this request.
    pub query: QueryParams,

    /// Hooks applied to the built request, in order.
    pub hooks: Vec<RequestHook>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            hooks: Vec::new(),
        }
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(key, value);
        self
    }

    /// Merges a pagination cursor into the query, replacing any previous one.
    ///
    /// Only `after` and `limit` travel back to the server; `before` is informational.
    pub fn apply_pagination(&mut self, meta: &ListMeta) {
        if let Some(after) = meta.after.as_deref().filter(|a| !a.is_empty()) {
            self.query.set("after", after);
        }
        if let Some(limit) = meta.limit.filter(|l| *l > 0) {
            self.query.set("limit", limit.to_string());
        }
    }
}

impl Default for RequestMetadata {
    fn default() -> Self {
        Self::new(Method::GET, "")
    }
}

impl fmt::Debug for RequestMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMetadata")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
