//! Status (feed post) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status identifier.
///
/// Mastodon ids are decimal strings without leading zeros, so ordering is
/// numeric: a longer string is a larger id, equal lengths compare
/// lexicographically. Larger id = newer status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(String);

impl StatusId {
    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for StatusId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for StatusId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for StatusId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StatusId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StatusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author subset carried on each status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Server-side account id.
    pub id: String,
    /// Local username.
    pub username: String,
    /// Webfinger-style handle; empty for local accounts.
    #[serde(default)]
    pub acct: String,
    /// Display name chosen by the user.
    #[serde(default)]
    pub display_name: String,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Account {
    /// The handle to show: `acct` when present, else the local username.
    pub fn handle(&self) -> &str {
        if self.acct.is_empty() {
            &self.username
        } else {
            &self.acct
        }
    }
}

/// A single post in a feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// Monotonic, sortable identifier.
    pub id: StatusId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Post body as the server returns it (HTML).
    pub content: String,
    /// Author.
    pub account: Account,
    /// Web URL of the post.
    #[serde(default)]
    pub url: Option<String>,
    /// Boosted status, if this is a boost.
    #[serde(default)]
    pub reblog: Option<Box<Status>>,
    /// Favourite count.
    #[serde(default)]
    pub favourites_count: u32,
    /// Boost count.
    #[serde(default)]
    pub reblogs_count: u32,
    /// Reply count.
    #[serde(default)]
    pub replies_count: u32,
}

impl Status {
    /// Plain-text rendering of `content` for presentation layers that do not
    /// render HTML.
    pub fn content_text(&self) -> String {
        let content = html_escape::decode_html_entities(&self.content)
            .to_string()
            .replace("<br>", "\n")
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
            .replace("</p><p>", "\n\n");

        regex_lite::Regex::new(r"<[^>]+>")
            .map(|re| re.replace_all(&content, "").to_string())
            .unwrap_or(content)
    }
}
