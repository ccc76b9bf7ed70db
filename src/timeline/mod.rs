//! Timeline paging
//!
//! A timeline is an ordered stack of fetched pages for one feed selector,
//! page 0 most recent. Pagination is a bidirectional cursor walk: newer
//! statuses come through the first page's `prev` cursor (or a synthesized
//! `since_id`), older ones only through server-supplied `next` cursors.

mod page;

pub use page::{Page, PageDecoder};

use reqwest::Url;

use crate::api::executor::Executor;
use crate::api::request::Request;
use crate::error::{Error, Result};
use crate::models::{Instance, Status};

/// Which feed a timeline shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimelineSelector {
    /// The federated public timeline.
    Public,
    /// Statuses carrying a hashtag.
    Hashtag(String),
    /// The authorized user's home timeline.
    Home,
    /// A user-curated list.
    List(String),
}

impl TimelineSelector {
    /// API path for this feed.
    pub fn path(&self) -> String {
        match self {
            Self::Public => "/api/v1/timelines/public".to_string(),
            Self::Hashtag(tag) => format!("/api/v1/timelines/tag/{tag}"),
            Self::Home => "/api/v1/timelines/home".to_string(),
            Self::List(id) => format!("/api/v1/timelines/list/{id}"),
        }
    }
}

/// Where a freshly fetched page is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Newer than anything held; insert at the front.
    Previous,
    /// Older than anything held; append at the back.
    Next,
}

/// Full paging state for one feed view.
#[derive(Debug, Clone)]
pub struct Timeline {
    selector: TimelineSelector,
    url: Url,
    pages: Vec<Page>,
}

impl Timeline {
    /// Timeline for a feed on an instance reached over HTTPS.
    pub fn new(instance: &Instance, selector: TimelineSelector) -> Result<Self> {
        let base = instance.base_url();
        Self::with_base_url(&base, selector)
    }

    /// Timeline rooted at an explicit base URL, e.g. a plain-HTTP instance
    /// in local development.
    pub fn with_base_url(base: &str, selector: TimelineSelector) -> Result<Self> {
        let base = base.trim_end_matches('/');
        let url = Url::parse(&format!("{base}{}", selector.path()))
            .map_err(|e| Error::MalformedRequest(format!("invalid timeline URL: {e}")))?;
        Ok(Self {
            selector,
            url,
            pages: Vec::new(),
        })
    }

    /// The feed this timeline shows.
    pub fn selector(&self) -> &TimelineSelector {
        &self.selector
    }

    /// Base URL the first page is fetched through.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Held pages, most recent first.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// All held statuses, newest first. Deduplication across refetched
    /// pages is the presentation layer's concern, keyed on status ids.
    pub fn statuses(&self) -> impl Iterator<Item = &Status> {
        self.pages.iter().flat_map(|page| page.statuses().iter())
    }

    /// URL that fetches statuses newer than anything held.
    ///
    /// Prefers the first page's server-supplied link, else synthesizes a
    /// `since_id` cursor from the newest held status. `Ok(None)` when no
    /// pages are held yet; the very first fetch goes through [`url`](Self::url),
    /// not through here. An empty first page with no explicit link has no id
    /// to anchor on and is an [`Error::EmptyPage`].
    pub fn previous_url(&self) -> Result<Option<Url>> {
        let Some(first) = self.pages.first() else {
            return Ok(None);
        };
        if let Some(url) = first.previous() {
            return Ok(Some(url.clone()));
        }
        let Some(newest) = first.first_id() else {
            return Err(Error::EmptyPage);
        };
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("since_id", newest.as_str());
        Ok(Some(url))
    }

    /// URL that fetches statuses older than anything held, if the server
    /// supplied one. Never synthesized; `max_id` cursors only come from the
    /// server.
    pub fn next_url(&self) -> Option<Url> {
        self.pages.last().and_then(|page| page.next().cloned())
    }

    /// Insert a fetched page at the boundary given by `direction`.
    ///
    /// Statuses that would break the global newest-to-oldest ordering are
    /// duplicates of already-held data from a concurrent insertion; they are
    /// dropped with a warning rather than failing the whole page. Returns
    /// the number of statuses kept.
    pub fn append_page(&mut self, mut page: Page, direction: Direction) -> usize {
        let originally_empty = page.is_empty();

        match direction {
            Direction::Previous => {
                if let Some(bound) = self.pages.first().and_then(Page::first_id).cloned() {
                    let dropped = page.retain_statuses(|id| *id > bound);
                    if dropped > 0 {
                        tracing::warn!(
                            page = %page.key(),
                            dropped,
                            "dropped out-of-order statuses from previous page"
                        );
                    }
                }
            }
            Direction::Next => {
                if let Some(bound) = self.pages.last().and_then(Page::last_id).cloned() {
                    let dropped = page.retain_statuses(|id| *id < bound);
                    if dropped > 0 {
                        tracing::warn!(
                            page = %page.key(),
                            dropped,
                            "dropped out-of-order statuses from next page"
                        );
                    }
                }
            }
        }

        if page.is_empty() && !(originally_empty && self.pages.is_empty()) {
            tracing::debug!(page = %page.key(), "skipping page with no new statuses");
            return 0;
        }

        let kept = page.len();
        match direction {
            Direction::Previous => self.pages.insert(0, page),
            Direction::Next => self.pages.push(page),
        }
        kept
    }
}

/// Drives page fetches for one timeline through an executor.
///
/// A failed fetch surfaces its error and leaves the held pages untouched.
pub struct TimelinePager {
    executor: Executor,
    timeline: Timeline,
}

impl TimelinePager {
    /// Pager over `timeline`, fetching through `executor`.
    pub fn new(executor: Executor, timeline: Timeline) -> Self {
        Self { executor, timeline }
    }

    /// The paging state accumulated so far.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Fetch the first page through the timeline's base URL. Returns the
    /// number of statuses kept.
    pub async fn load_initial(&mut self) -> Result<usize> {
        let url = self.timeline.url().clone();
        let page = self.fetch(url).await?;
        Ok(self.timeline.append_page(page, Direction::Previous))
    }

    /// Fetch statuses newer than anything held. Falls back to the initial
    /// fetch when no pages are held yet.
    pub async fn load_previous(&mut self) -> Result<usize> {
        match self.timeline.previous_url()? {
            Some(url) => {
                let page = self.fetch(url).await?;
                Ok(self.timeline.append_page(page, Direction::Previous))
            }
            None => self.load_initial().await,
        }
    }

    /// Fetch the next older page if the server supplied a cursor; `Ok(None)`
    /// when it did not.
    pub async fn load_next(&mut self) -> Result<Option<usize>> {
        let Some(url) = self.timeline.next_url() else {
            return Ok(None);
        };
        let page = self.fetch(url).await?;
        Ok(Some(self.timeline.append_page(page, Direction::Next)))
    }

    async fn fetch(&self, url: Url) -> Result<Page> {
        tracing::debug!(%url, "fetching timeline page");
        let request = Request::from_url(&url);
        self.executor.execute(&request, &PageDecoder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, status};

    fn timeline() -> Timeline {
        Timeline::new(&Instance::new("mastodon.social"), TimelineSelector::Public).unwrap()
    }

    fn page(ids: &[&str]) -> Page {
        page_with_links(ids, None, None)
    }

    fn page_with_links(ids: &[&str], previous: Option<&str>, next: Option<&str>) -> Page {
        Page::new(
            Url::parse("https://mastodon.social/api/v1/timelines/public").unwrap(),
            ids.iter().map(|id| status(id)).collect(),
            previous.map(|u| Url::parse(u).unwrap()),
            next.map(|u| Url::parse(u).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn selector_paths() {
        assert_eq!(TimelineSelector::Public.path(), "/api/v1/timelines/public");
        assert_eq!(TimelineSelector::Home.path(), "/api/v1/timelines/home");
        assert_eq!(
            TimelineSelector::Hashtag("rustlang".into()).path(),
            "/api/v1/timelines/tag/rustlang"
        );
        assert_eq!(
            TimelineSelector::List("42".into()).path(),
            "/api/v1/timelines/list/42"
        );
    }

    #[test]
    fn previous_url_synthesizes_since_id() {
        let mut timeline = timeline();
        timeline.append_page(page(&["500", "490", "480"]), Direction::Previous);

        let url = timeline.previous_url().unwrap().unwrap();
        assert_eq!(
            url.as_str(),
            "https://mastodon.social/api/v1/timelines/public?since_id=500"
        );
    }

    #[test]
    fn previous_url_prefers_explicit_link() {
        let mut timeline = timeline();
        timeline.append_page(
            page_with_links(
                &["500", "480"],
                Some("https://mastodon.social/api/v1/timelines/public?min_id=500"),
                None,
            ),
            Direction::Previous,
        );

        let url = timeline.previous_url().unwrap().unwrap();
        assert_eq!(url.query(), Some("min_id=500"));
    }

    #[test]
    fn previous_url_without_pages_is_none() {
        assert!(timeline().previous_url().unwrap().is_none());
    }

    #[test]
    fn empty_first_page_is_an_error_not_a_crash() {
        let mut timeline = timeline();
        timeline.append_page(page(&[]), Direction::Previous);
        assert!(matches!(timeline.previous_url(), Err(Error::EmptyPage)));
    }

    #[test]
    fn next_url_is_never_synthesized() {
        let mut timeline = timeline();
        timeline.append_page(page(&["500", "480"]), Direction::Previous);
        assert!(timeline.next_url().is_none());
    }

    #[test]
    fn next_url_uses_explicit_link() {
        let mut timeline = timeline();
        timeline.append_page(
            page_with_links(
                &["500", "480"],
                None,
                Some("https://mastodon.social/api/v1/timelines/public?max_id=480"),
            ),
            Direction::Previous,
        );
        assert_eq!(
            timeline.next_url().unwrap().as_str(),
            "https://mastodon.social/api/v1/timelines/public?max_id=480"
        );
    }

    #[test]
    fn append_keeps_per_page_invariant() {
        let mut timeline = timeline();
        timeline.append_page(page(&["500", "490"]), Direction::Previous);
        timeline.append_page(page(&["520", "510"]), Direction::Previous);
        timeline.append_page(page(&["480", "470"]), Direction::Next);

        for page in timeline.pages() {
            assert!(page.first_id() >= page.last_id());
        }
        let ids: Vec<&str> = timeline.statuses().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["520", "510", "500", "490", "480", "470"]);
    }

    #[test]
    fn overlapping_previous_page_drops_duplicates() {
        testutil::init_tracing();
        let mut timeline = timeline();
        timeline.append_page(page(&["500", "490"]), Direction::Previous);

        let kept = timeline.append_page(page(&["520", "510", "500"]), Direction::Previous);
        assert_eq!(kept, 2);
        let ids: Vec<&str> = timeline.statuses().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["520", "510", "500", "490"]);
    }

    #[test]
    fn overlapping_next_page_drops_duplicates() {
        let mut timeline = timeline();
        timeline.append_page(page(&["500", "490"]), Direction::Previous);

        let kept = timeline.append_page(page(&["490", "480"]), Direction::Next);
        assert_eq!(kept, 1);
        let ids: Vec<&str> = timeline.statuses().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["500", "490", "480"]);
    }

    #[test]
    fn fully_duplicate_page_is_skipped() {
        let mut timeline = timeline();
        timeline.append_page(page(&["500", "490"]), Direction::Previous);

        let kept = timeline.append_page(page(&["500", "490"]), Direction::Previous);
        assert_eq!(kept, 0);
        assert_eq!(timeline.pages().len(), 1);
    }

    #[tokio::test]
    async fn pager_walks_initial_then_next() {
        let (listener, base) = testutil::bind_http().await;
        let next_link = format!("{base}/api/v1/timelines/public?max_id=490");
        let responses = vec![
            testutil::json_response(
                "200 OK",
                r#"[{"id":"500","created_at":"2022-11-04T12:00:00.000Z","content":"","account":{"id":"7","username":"schwa"}},{"id":"490","created_at":"2022-11-04T11:00:00.000Z","content":"","account":{"id":"7","username":"schwa"}}]"#,
                &[("link", &format!("<{next_link}>; rel=\"next\""))],
            ),
            testutil::json_response(
                "200 OK",
                r#"[{"id":"480","created_at":"2022-11-04T10:00:00.000Z","content":"","account":{"id":"7","username":"schwa"}}]"#,
                &[],
            ),
        ];
        testutil::serve_http(listener, responses, std::time::Duration::ZERO);

        let executor = Executor::new(std::time::Duration::from_secs(5)).unwrap();
        let timeline = Timeline::with_base_url(&base, TimelineSelector::Public).unwrap();
        let mut pager = TimelinePager::new(executor, timeline);

        assert_eq!(pager.load_initial().await.unwrap(), 2);
        assert_eq!(pager.load_next().await.unwrap(), Some(1));
        assert_eq!(pager.load_next().await.unwrap(), None);

        let ids: Vec<&str> = pager.timeline().statuses().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["500", "490", "480"]);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_pages_untouched() {
        let base = testutil::spawn_http(
            vec![
                testutil::json_response(
                    "200 OK",
                    r#"[{"id":"500","created_at":"2022-11-04T12:00:00.000Z","content":"","account":{"id":"7","username":"schwa"}}]"#,
                    &[],
                ),
                testutil::json_response("500 Internal Server Error", r#"{"error":"oops"}"#, &[]),
            ],
            std::time::Duration::ZERO,
        )
        .await;

        let executor = Executor::new(std::time::Duration::from_secs(5)).unwrap();
        let timeline = Timeline::with_base_url(&base, TimelineSelector::Public).unwrap();
        let mut pager = TimelinePager::new(executor, timeline);

        pager.load_initial().await.unwrap();
        let err = pager.load_previous().await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
        assert_eq!(pager.timeline().pages().len(), 1);
        assert_eq!(pager.timeline().statuses().count(), 1);
    }
}
