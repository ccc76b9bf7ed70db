//! Typed HTTP request core
//!
//! Requests are plain data ([`Request`]), response decoding is a pluggable
//! strategy ([`Decode`]), and the [`Executor`] is the only place that
//! touches the transport. Construction failures, transport failures, bad
//! statuses and schema mismatches each map to their own [`crate::Error`]
//! variant so callers can tell them apart.

pub mod decode;
pub mod executor;
pub mod request;

pub use decode::{Decode, JsonDecoder, ResponseContext};
pub use executor::{CancelHandle, CancelToken, Executor, cancel_pair};
pub use request::{Body, FinalRequest, PartialRequest, Request};
