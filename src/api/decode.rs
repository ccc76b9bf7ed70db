//! Response decoding strategies

use std::marker::PhantomData;

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Status line and headers of the response being decoded.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final URL after redirects.
    pub url: Url,
}

impl ResponseContext {
    /// Reject non-2xx responses, carrying the raw body for diagnostics.
    pub fn check_status(&self, bytes: &[u8]) -> Result<()> {
        if self.status.is_success() {
            Ok(())
        } else {
            Err(Error::HttpStatus {
                status: self.status.as_u16(),
                body: String::from_utf8_lossy(bytes).into_owned(),
            })
        }
    }
}

/// Strategy turning raw response bytes plus status metadata into a typed
/// value.
///
/// Implementations must classify non-2xx responses as
/// [`Error::HttpStatus`]; a parse failure on a 2xx body is an
/// [`Error::Decode`].
pub trait Decode {
    /// The decoded value.
    type Output;

    /// Decode `bytes` in the light of `context`.
    fn process(&self, bytes: &[u8], context: &ResponseContext) -> Result<Self::Output>;
}

/// Decodes a 2xx JSON body into any deserializable type.
#[derive(Debug)]
pub struct JsonDecoder<T>(PhantomData<T>);

impl<T> JsonDecoder<T> {
    /// Decoder for `T`.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Decode for JsonDecoder<T> {
    type Output = T;

    fn process(&self, bytes: &[u8], context: &ResponseContext) -> Result<T> {
        context.check_status(bytes)?;
        serde_json::from_slice(bytes).map_err(Error::from)
    }
}
