//! OAuth application and token models

use serde::{Deserialize, Serialize};

/// Client registration result from `POST /api/v1/apps`.
///
/// Created once per (instance, client name) pair; immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredApplication {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

/// Bearer credential from `POST /oauth/token`.
///
/// Never mutated; a re-authorization produces a new token that supersedes
/// this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Access token sent as the Authorization bearer value.
    pub access_token: String,
    /// Token type, normally `Bearer`.
    pub token_type: String,
    /// Scopes granted to the token.
    #[serde(default)]
    pub scope: Option<String>,
    /// Creation time as a unix timestamp.
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_ignores_unknown_fields() {
        let app: RegisteredApplication = serde_json::from_str(
            r#"{"id":"1","name":"roost","client_id":"abc","client_secret":"def","vapid_key":"xyz"}"#,
        )
        .unwrap();
        assert_eq!(app.client_id, "abc");
        assert_eq!(app.client_secret, "def");
    }

    #[test]
    fn token_requires_access_token() {
        let missing: Result<Token, _> = serde_json::from_str(r#"{"token_type":"Bearer"}"#);
        assert!(missing.is_err());
    }
}
