//! HTTP calls as data
//!
//! A [`Request`] describes an outbound call independent of any transport.
//! It is applied onto a [`PartialRequest`] accumulator and finalized into a
//! transport-ready [`FinalRequest`]; the executor is the only place that
//! performs I/O.

use reqwest::{Method, Url};

use crate::error::{Error, Result};

/// Request body encoding.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Form parameters, sent URL-encoded as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Raw bytes with an explicit content type.
    Raw(Vec<u8>, String),
}

/// Immutable description of an outbound HTTP call.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    base: Option<String>,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Body,
}

impl Request {
    /// Request with an explicit method for a host-relative path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            base: None,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// GET request for a host-relative path.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request for a host-relative path.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// GET request for an absolute URL, e.g. a server-supplied pagination
    /// link.
    pub fn from_url(url: &Url) -> Self {
        let mut base = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
        if let Some(port) = url.port() {
            base.push_str(&format!(":{port}"));
        }
        Self {
            method: Method::GET,
            base: Some(base),
            path: url.path().to_string(),
            query: url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Address the request at a base URL (scheme plus host, e.g.
    /// `https://mastodon.social`).
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// URL-encoded form body.
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = Body::Form(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }

    /// Raw body with an explicit content type.
    pub fn body(mut self, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Body::Raw(bytes, content_type.into());
        self
    }

    /// Copy this request's fields into an accumulator.
    pub fn apply(&self, partial: &mut PartialRequest) -> Result<()> {
        if self.path.is_empty() {
            return Err(Error::MalformedRequest("empty request path".into()));
        }
        partial.method = Some(self.method.clone());
        if let Some(base) = &self.base {
            partial.base = Some(base.clone());
        }
        partial.path = Some(self.path.clone());
        partial.query.extend(self.query.iter().cloned());
        partial.headers.extend(self.headers.iter().cloned());
        if !matches!(self.body, Body::Empty) {
            partial.body = self.body.clone();
        }
        Ok(())
    }

    /// Apply onto a fresh accumulator and finalize in one step.
    pub fn build(&self) -> Result<FinalRequest> {
        let mut partial = PartialRequest::default();
        self.apply(&mut partial)?;
        partial.finalize()
    }
}

/// Mutable accumulator a [`Request`] is applied onto.
///
/// Several sources may contribute fields (the request itself, an instance
/// default, a decorating layer) before finalization.
#[derive(Debug, Clone, Default)]
pub struct PartialRequest {
    /// HTTP method; GET when left unset.
    pub method: Option<Method>,
    /// Base URL (scheme plus host).
    pub base: Option<String>,
    /// Host-relative path.
    pub path: Option<String>,
    /// Query parameters, in append order.
    pub query: Vec<(String, String)>,
    /// Headers, in append order.
    pub headers: Vec<(String, String)>,
    /// Body encoding.
    pub body: Body,
}

impl PartialRequest {
    /// Materialize a fully-addressed, transport-ready request.
    pub fn finalize(self) -> Result<FinalRequest> {
        let base = self
            .base
            .ok_or_else(|| Error::MalformedRequest("missing base URL".into()))?;
        let path = self
            .path
            .ok_or_else(|| Error::MalformedRequest("missing request path".into()))?;

        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| Error::MalformedRequest(format!("invalid URL from {base}{path}: {e}")))?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        let body = match self.body {
            Body::Empty => None,
            Body::Form(pairs) => Some((
                encode_form(&pairs).into_bytes(),
                "application/x-www-form-urlencoded".to_string(),
            )),
            Body::Raw(bytes, content_type) => Some((bytes, content_type)),
        };

        Ok(FinalRequest {
            method: self.method.unwrap_or(Method::GET),
            url,
            headers: self.headers,
            body,
        })
    }
}

/// Fully-addressed request ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct FinalRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// Headers, in append order.
    pub headers: Vec<(String, String)>,
    /// Body bytes and content type.
    pub body: Option<(Vec<u8>, String)>,
}

fn encode_form(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
