//! Pull-based iteration over cursor-paginated list endpoints.

use crate::envelope::{List, ListMeta};
use crate::{Error, Result};
use futures::future::BoxFuture;
use futures::Stream;

/// Fetches the page following the given cursor.
pub type PageFn<T> = Box<dyn Fn(&ListMeta) -> BoxFuture<'static, Result<List<T>>> + Send>;

/// A forward-only sequence over every item of a list endpoint.
///
/// Pages are fetched one at a time as [`advance`](Iter::advance) drains the previous
/// one. Iteration never fails loudly: once a fetch fails the iterator stops, and the
/// error is available from [`err`](Iter::err).
///
/// # Examples
///
/// ```no_run
/// use duffel::Client;
///
/// # async fn example() -> Result<(), duffel::Error> {
/// let client = Client::new("duffel_test_123")?;
/// let mut airlines = client.list_airlines().await;
///
/// while airlines.advance().await {
///     if let Some(airline) = airlines.current() {
///         println!("{}", airline.name);
///     }
/// }
///
/// if let Some(err) = airlines.err() {
///     eprintln!("stopped early: {}", err);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Iter<T> {
    fetch: Option<PageFn<T>>,
    items: std::vec::IntoIter<T>,
    current: Option<T>,
    meta: ListMeta,
    request_id: Option<String>,
    err: Option<Error>,
}

impl<T> Iter<T> {
    /// Creates an iterator and fetches the first page.
    pub async fn new(fetch: PageFn<T>) -> Self {
        let mut iter = Self {
            fetch: Some(fetch),
            items: Vec::new().into_iter(),
            current: None,
            meta: ListMeta::default(),
            request_id: None,
            err: None,
        };
        iter.fetch_page().await;
        iter
    }

    /// Creates an iterator that yields nothing and reports `err`.
    pub fn from_error(err: Error) -> Self {
        Self {
            fetch: None,
            items: Vec::new().into_iter(),
            current: None,
            meta: ListMeta::default(),
            request_id: None,
            err: Some(err),
        }
    }

    /// Moves to the next item, fetching the next page when the buffered one is drained.
    ///
    /// Returns `false` once the sequence is exhausted or a fetch failed.
    pub async fn advance(&mut self) -> bool {
        loop {
            if self.err.is_some() {
                return false;
            }

            if let Some(item) = self.items.next() {
                self.current = Some(item);
                return true;
            }

            if !self.meta.has_more() {
                return false;
            }
            self.fetch_page().await;
        }
    }

    /// The item the last successful [`advance`](Iter::advance) moved to.
    ///
    /// Still returns the last item after the sequence ends or fails.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// The error that stopped iteration, if any.
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Pagination metadata of the most recently fetched page.
    pub fn meta(&self) -> &ListMeta {
        &self.meta
    }

    /// The request id of the most recently fetched page.
    pub fn last_request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Drains the iterator, failing with the terminal error if there was one.
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while self.advance().await {
            if let Some(item) = self.current.take() {
                items.push(item);
            }
        }
        match self.err {
            Some(err) => Err(err),
            None => Ok(items),
        }
    }

    /// Adapts the iterator into a stream that ends with the terminal error, if any.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut iter = state?;
            if iter.advance().await {
                let item = iter.current.take()?;
                return Some((Ok(item), Some(iter)));
            }
            iter.err.take().map(|err| (Err(err), None))
        })
    }

    async fn fetch_page(&mut self) {
        let Some(fetch) = &self.fetch else {
            return;
        };

        match fetch(&self.meta).await {
            Ok(list) => {
                tracing::debug!(
                    items = list.items.len(),
                    after = list.meta.after.as_deref().unwrap_or(""),
                    "Fetched page"
                );
                self.items = list.items.into_iter();
                self.meta = list.meta;
                self.request_id = list.request_id;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Page fetch failed, stopping iteration");
                self.items = Vec::new().into_iter();
                self.err = Some(err);
                self.fetch = None;
            }
        }
    }
}
