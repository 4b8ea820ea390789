//! Fluent description of a single endpoint call.

use crate::{
    config::MAX_CALL_DURATION,
    envelope::{List, ListMeta, Payload, ResponsePayload},
    iter::Iter,
    metadata::{ParamEncoder, RequestMetadata},
    Client, Error, Result,
};
use futures::FutureExt;
use http::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounds a call by a deadline and, optionally, a cancellation token.
///
/// Everything the call awaits (rate-limiter waits, network I/O, backoff sleeps) is
/// dropped as soon as either fires.
#[derive(Debug, Clone)]
pub(crate) struct CallGuard {
    deadline: Duration,
    cancel: Option<CancellationToken>,
}

impl CallGuard {
    pub(crate) fn new(deadline: Duration) -> Self {
        Self {
            deadline: deadline.min(MAX_CALL_DURATION),
            cancel: None,
        }
    }

    pub(crate) async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timed = tokio::time::timeout(self.deadline, call);

        let outcome = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(Error::Cancelled),
                    outcome = timed => outcome,
                }
            }
            None => timed.await,
        };

        outcome.unwrap_or_else(|_| {
            tracing::warn!(deadline_ms = self.deadline.as_millis(), "Call deadline exceeded");
            Err(Error::Timeout)
        })
    }
}

/// Describes one call: method, path, query, body and hooks, then runs it with a
/// finalizer.
///
/// `Req` is the type wrapped in the `{"data": ...}` request envelope and `Resp` the
/// type expected inside the response envelope. Use `()` for `Req` on calls without
/// a body.
///
/// # Examples
///
/// ```no_run
/// use duffel::{Aircraft, Client};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), duffel::Error> {
/// let client = Client::new("duffel_test_123")?;
///
/// let aircraft = client
///     .request::<(), Aircraft>()
///     .get("/air/aircraft")
///     .param("limit", "50")
///     .deadline(Duration::from_secs(10))
///     .all()
///     .await
///     .collect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RequestBuilder<Req, Resp> {
    client: Client,
    metadata: RequestMetadata,
    body: Option<Req>,
    param_error: Option<Error>,
    guard: CallGuard,
    _response: PhantomData<fn() -> Resp>,
}

impl<Req, Resp> RequestBuilder<Req, Resp> {
    pub(crate) fn new(client: Client, deadline: Duration) -> Self {
        Self {
            client,
            metadata: RequestMetadata::default(),
            body: None,
            param_error: None,
            guard: CallGuard::new(deadline),
            _response: PhantomData,
        }
    }

    /// Sets the method and the path.
    pub fn method(mut self, method: Method, path: impl Into<String>) -> Self {
        self.metadata.method = method;
        self.metadata.path = path.into();
        self
    }

    /// Sets a `GET` to `path`.
    pub fn get(self, path: impl Into<String>) -> Self {
        self.method(Method::GET, path)
    }

    /// Sets a `POST` to `path`.
    pub fn post(self, path: impl Into<String>) -> Self {
        self.method(Method::POST, path)
    }

    /// Sets a `PATCH` to `path`.
    pub fn patch(self, path: impl Into<String>) -> Self {
        self.method(Method::PATCH, path)
    }

    /// Sets a `DELETE` to `path`.
    pub fn delete(self, path: impl Into<String>) -> Self {
        self.method(Method::DELETE, path)
    }

    /// Sets the value sent as `{"data": body}`. Ignored for `GET`.
    pub fn body(mut self, body: Req) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a query parameter. Repeated keys are sent repeatedly.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.query.append(key, value);
        self
    }

    /// Lets `params` write its own query parameters.
    ///
    /// An encoding failure is reported by the finalizer, before anything is sent.
    pub fn params(mut self, params: impl ParamEncoder) -> Self {
        if self.param_error.is_none() {
            if let Err(e) = params.encode(&mut self.metadata.query) {
                self.param_error = Some(e);
            }
        }
        self
    }

    /// Adds a hook that can mutate the HTTP request right before it is sent.
    pub fn hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut reqwest::Request) -> Result<()> + Send + Sync + 'static,
    {
        self.metadata.hooks.push(Arc::new(hook));
        self
    }

    /// Shortens the deadline of this call. It never exceeds 90 seconds.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.guard.deadline = deadline.min(MAX_CALL_DURATION);
        self
    }

    /// Abandons the call with [`Error::Cancelled`] once `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.guard.cancel = Some(token);
        self
    }
}

impl<Req, Resp> RequestBuilder<Req, Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned + Send + 'static,
{
    /// Runs the call and returns the value inside `{"data": ...}`.
    pub async fn one(self) -> Result<Resp> {
        let (client, metadata, body, guard) = self.prepare()?;

        guard
            .run(async move {
                let response = client.execute(&metadata, body.as_deref()).await?;
                let payload: ResponsePayload<Resp> = response.decode()?;
                Ok(payload.data)
            })
            .await
    }

    /// Runs the call once and returns the array inside `{"data": [...]}`, without
    /// following pagination cursors.
    pub async fn slice(self) -> Result<Vec<Resp>> {
        let (client, metadata, body, guard) = self.prepare()?;

        guard
            .run(async move {
                let response = client.execute(&metadata, body.as_deref()).await?;
                let payload: ResponsePayload<Vec<Resp>> = response.decode()?;
                Ok(payload.data)
            })
            .await
    }

    /// Returns an iterator over every item of a paginated list.
    ///
    /// The first page is fetched before this returns. Each page is a separate call
    /// with its own deadline; the cancellation token applies to all of them.
    pub async fn all(self) -> Iter<Resp> {
        let (client, metadata, body, guard) = match self.prepare() {
            Ok(parts) => parts,
            Err(e) => return Iter::from_error(e),
        };
        let body: Option<Arc<[u8]>> = body.map(Arc::from);

        Iter::new(Box::new(move |cursor: &ListMeta| {
            let client = client.clone();
            let guard = guard.clone();
            let body = body.clone();
            let mut metadata = metadata.clone();
            metadata.apply_pagination(cursor);

            async move {
                guard
                    .run(async {
                        let response = client.execute(&metadata, body.as_deref()).await?;
                        let payload: ResponsePayload<Vec<Resp>> = response.decode()?;
                        Ok(List::from(payload).with_request_id(response.request_id))
                    })
                    .await
            }
            .boxed()
        }))
        .await
    }

    fn prepare(self) -> Result<(Client, RequestMetadata, Option<Vec<u8>>, CallGuard)> {
        if let Some(e) = self.param_error {
            return Err(e);
        }

        let body = match self.body {
            Some(body) if self.metadata.method != Method::GET => Some(
                serde_json::to_vec(&Payload::new(body))
                    .map_err(|e| Error::SerializationFailed(e.to_string()))?,
            ),
            _ => None,
        };

        Ok((self.client, self.metadata, body, self.guard))
    }
}
