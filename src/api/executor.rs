//! Request execution against a live transport

use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;

use crate::api::decode::{Decode, ResponseContext};
use crate::api::request::{FinalRequest, Request};
use crate::error::{Error, Result};
use crate::models::Token;

/// Executes requests and applies a decoder to each response.
///
/// Cloneable; all clones share the underlying connection pool. An executor
/// either carries a bearer token (applied to every request) or is anonymous.
#[derive(Debug, Clone)]
pub struct Executor {
    client: Client,
    bearer: Option<String>,
}

impl Executor {
    /// Build an executor with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::MalformedRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            bearer: None,
        })
    }

    /// The same executor, authorized with a bearer token.
    pub fn authorized(&self, token: &Token) -> Self {
        Self {
            client: self.client.clone(),
            bearer: Some(token.access_token.clone()),
        }
    }

    /// Execute a request and decode the response.
    ///
    /// Suspends until the transport completes. Dropping the returned future
    /// aborts the in-flight call.
    pub async fn execute<D: Decode>(&self, request: &Request, decoder: &D) -> Result<D::Output> {
        let built = request.build()?;
        self.execute_final(built, decoder).await
    }

    /// Like [`execute`](Self::execute), but aborts the in-flight transport
    /// and returns [`Error::Cancelled`] when `cancel` fires.
    pub async fn execute_cancellable<D: Decode>(
        &self,
        request: &Request,
        decoder: &D,
        cancel: &CancelToken,
    ) -> Result<D::Output> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            result = self.execute(request, decoder) => result,
            () = cancel.cancelled() => Err(Error::Cancelled),
        }
    }

    async fn execute_final<D: Decode>(&self, request: FinalRequest, decoder: &D) -> Result<D::Output> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(bearer) = &self.bearer {
            builder = builder.header("Authorization", format!("Bearer {bearer}"));
        }
        if let Some((bytes, content_type)) = request.body {
            builder = builder.header("Content-Type", content_type.as_str()).body(bytes);
        }

        let response = builder.send().await.map_err(classify_transport)?;
        let context = ResponseContext {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        };
        let bytes = response.bytes().await.map_err(classify_transport)?;
        decoder.process(&bytes, &context)
    }
}

fn classify_transport(error: reqwest::Error) -> Error {
    if error.is_builder() {
        Error::MalformedRequest(error.to_string())
    } else if error.is_connect() || error.is_timeout() || error.is_request() || error.is_body() {
        Error::Transport(error)
    } else {
        tracing::error!("non-HTTP response from transport: {error}");
        Error::NonHttpResponse(error)
    }
}

/// Signals cancellation to an in-flight
/// [`execute_cancellable`](Executor::execute_cancellable) call.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Abort the operation holding the paired token.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Cancellation signal observed by the executor.
#[derive(Debug, Clone)]
pub struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    /// Whether cancellation has already been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the paired handle fires. Pends forever if the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a connected cancellation pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelToken(rx))
}
