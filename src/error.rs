//! Crate error taxonomy

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the request layer, the authorization flow and the
/// timeline paging engine.
///
/// Executor errors propagate through the higher layers unmodified; retrying
/// is a caller decision, nothing in the core retries on its own.
#[derive(Debug, Error)]
pub enum Error {
    /// A request could not be constructed from its parts. This is a
    /// programmer or configuration error and is never worth retrying.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Network-level failure: DNS, connect, timeout, interrupted body.
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// The transport produced something that is not classifiable as an HTTP
    /// response. Should not happen against a real instance; represented and
    /// logged loudly rather than swallowed or panicked on.
    #[error("non-HTTP response: {0}")]
    NonHttpResponse(#[source] reqwest::Error),

    /// Non-2xx response. The raw body is carried for diagnostics.
    #[error("server returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A 2xx response whose body does not match the expected schema. Signals
    /// an API or version mismatch with the instance.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A fetched page's statuses were not in newest-to-oldest order.
    #[error("page statuses out of order for {url}")]
    UnorderedPage {
        /// URL the page was fetched from.
        url: String,
    },

    /// The operation was cancelled while the transport was in flight, or its
    /// result arrived after a cancel and was discarded.
    #[error("operation cancelled")]
    Cancelled,

    /// Token exchange attempted without a matching registered application.
    #[error("no application registered for this instance")]
    NotRegistered,

    /// The first timeline page holds no statuses, so there is no id to
    /// anchor `since_id` pagination on.
    #[error("timeline page has no statuses to anchor pagination on")]
    EmptyPage,

    /// A configuration or credential file could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}
