//! Instance identity

use serde::{Deserialize, Serialize};

/// A single server in the federated network, identified by host name.
///
/// Equality and hashing are by host; two values with the same host are the
/// same instance regardless of how they were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instance {
    /// Host name, e.g. `mastodon.social`.
    pub host: String,
}

impl Instance {
    /// Create an instance from a host name.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Base URL for API calls against this instance.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.host)
    }
}

impl From<&str> for Instance {
    fn from(host: &str) -> Self {
        Self::new(host)
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.host)
    }
}
