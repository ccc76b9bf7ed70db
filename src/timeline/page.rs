//! Fetched timeline pages

use reqwest::Url;
use reqwest::header::LINK;

use crate::api::decode::{Decode, ResponseContext};
use crate::error::{Error, Result};
use crate::models::{Status, StatusId};

/// One fetched batch of statuses for a timeline, newest first.
///
/// Non-empty pages satisfy `first.id >= last.id`; a body violating that is
/// rejected at construction, the server broke the documented ordering.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    statuses: Vec<Status>,
    previous: Option<Url>,
    next: Option<Url>,
}

impl Page {
    /// Build a page, validating the newest-to-oldest ordering contract.
    pub fn new(
        url: Url,
        statuses: Vec<Status>,
        previous: Option<Url>,
        next: Option<Url>,
    ) -> Result<Self> {
        let ordered = statuses.windows(2).all(|pair| pair[0].id >= pair[1].id);
        if !ordered {
            return Err(Error::UnorderedPage {
                url: url.to_string(),
            });
        }
        Ok(Self {
            url,
            statuses,
            previous,
            next,
        })
    }

    /// URL this page was fetched from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Statuses, newest first.
    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Server-supplied link to the adjacent newer page.
    pub fn previous(&self) -> Option<&Url> {
        self.previous.as_ref()
    }

    /// Server-supplied link to the adjacent older page.
    pub fn next(&self) -> Option<&Url> {
        self.next.as_ref()
    }

    /// Id of the newest status.
    pub fn first_id(&self) -> Option<&StatusId> {
        self.statuses.first().map(|status| &status.id)
    }

    /// Id of the oldest status.
    pub fn last_id(&self) -> Option<&StatusId> {
        self.statuses.last().map(|status| &status.id)
    }

    /// Number of statuses held.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Whether the page holds no statuses.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Identity derived from the fetch URL and the id span. Not true
    /// uniqueness; presentation layers use it to deduplicate refetches.
    pub fn key(&self) -> String {
        match (self.statuses.first(), self.statuses.last()) {
            (Some(first), Some(last)) => {
                format!("{} | {} {} -> {}", self.url, self.statuses.len(), first.id, last.id)
            }
            _ => format!("{} | empty", self.url),
        }
    }

    /// Keep only statuses matching `keep`; returns how many were dropped.
    /// Filtering preserves the internal ordering.
    pub(crate) fn retain_statuses(&mut self, keep: impl Fn(&StatusId) -> bool) -> usize {
        let before = self.statuses.len();
        self.statuses.retain(|status| keep(&status.id));
        before - self.statuses.len()
    }
}

/// Decodes a timeline response into a [`Page`], picking pagination cursors
/// out of the `Link` header.
#[derive(Debug)]
pub struct PageDecoder;

impl Decode for PageDecoder {
    type Output = Page;

    fn process(&self, bytes: &[u8], context: &ResponseContext) -> Result<Page> {
        context.check_status(bytes)?;
        let statuses: Vec<Status> = serde_json::from_slice(bytes)?;
        let (previous, next) = context
            .headers
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(parse_link_header)
            .unwrap_or((None, None));
        Page::new(context.url.clone(), statuses, previous, next)
    }
}

/// Parse a `Link` header into `(previous, next)` pagination URLs.
///
/// Format: `<https://...>; rel="next", <https://...>; rel="prev"`.
pub(crate) fn parse_link_header(value: &str) -> (Option<Url>, Option<Url>) {
    let mut previous = None;
    let mut next = None;
    for field in value.split(',') {
        let mut url = None;
        let mut rel = None;
        for segment in field.split(';') {
            let segment = segment.trim();
            if let Some(target) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Url::parse(target).ok();
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"'));
            }
        }
        match (rel, url) {
            (Some("prev"), Some(url)) => previous = Some(url),
            (Some("next"), Some(url)) => next = Some(url),
            _ => {}
        }
    }
    (previous, next)
}
