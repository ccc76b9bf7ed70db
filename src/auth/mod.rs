//! OAuth authorization flow
//!
//! Out-of-band flow against a single instance: register an application,
//! send the user to the authorize URL in a browser, exchange the pasted
//! code for a bearer token. The presentation layer owns the browser and the
//! code entry field; this module owns the state.

pub mod store;

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::api::decode::JsonDecoder;
use crate::api::executor::Executor;
use crate::api::request::Request;
use crate::error::{Error, Result};
use crate::models::{Instance, RegisteredApplication, Token};

/// Fixed out-of-band redirect marker; the user copies the code by hand
/// instead of being redirected to a local callback server.
pub const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Scopes requested at registration and token exchange.
pub const SCOPES: &str = "read write follow push";

/// Authorization lifecycle against one instance.
///
/// Transitions run `Unauthorized` → `Registered` → `Authorized`; `cancel`
/// resets to `Unauthorized` from anywhere. The state never skips from
/// `Unauthorized` straight to `Authorized`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthorizationState {
    /// No application registered.
    #[default]
    Unauthorized,
    /// Application registered, no token yet.
    Registered(RegisteredApplication),
    /// Token obtained.
    Authorized(RegisteredApplication, Token),
}

impl AuthorizationState {
    /// The registered application, if any.
    pub fn application(&self) -> Option<&RegisteredApplication> {
        match self {
            Self::Unauthorized => None,
            Self::Registered(app) | Self::Authorized(app, _) => Some(app),
        }
    }

    /// The bearer token, if authorized.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Authorized(_, token) => Some(token),
            _ => None,
        }
    }

    /// Whether a token is held.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(..))
    }
}

struct Inner {
    state: AuthorizationState,
    generation: u64,
}

/// Drives client registration and token acquisition for one instance.
///
/// State is owned here single-writer; observers subscribe to change
/// notifications instead of sharing the mutable state. Concurrent
/// transition calls are last-writer-wins, and anything that completes after
/// a `cancel` is discarded via a generation counter rather than committed.
pub struct Authorizer {
    executor: Executor,
    instance: Instance,
    base: String,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<AuthorizationState>,
    in_flight_tx: watch::Sender<Option<DateTime<Utc>>>,
}

impl Authorizer {
    /// Authorizer for an instance reached over HTTPS.
    pub fn new(executor: Executor, instance: Instance) -> Self {
        let base = instance.base_url();
        Self::with_base_url(executor, instance, base)
    }

    /// Authorizer with an explicit base URL, e.g. a plain-HTTP instance in
    /// local development.
    pub fn with_base_url(executor: Executor, instance: Instance, base: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(AuthorizationState::Unauthorized);
        let (in_flight_tx, _) = watch::channel(None);
        Self {
            executor,
            instance,
            base: base.into().trim_end_matches('/').to_string(),
            inner: Mutex::new(Inner {
                state: AuthorizationState::Unauthorized,
                generation: 0,
            }),
            state_tx,
            in_flight_tx,
        }
    }

    /// Restore a previously persisted state, e.g. from the credential store.
    pub fn restore(&self, state: AuthorizationState) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = state.clone();
        self.state_tx.send_replace(state);
    }

    /// The instance this authorizer talks to.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthorizationState {
        self.state_tx.borrow().clone()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<AuthorizationState> {
        self.state_tx.subscribe()
    }

    /// Observe the "token exchange running since T" overlay. This is a
    /// transient UI signal attached to, not part of, the core state.
    pub fn subscribe_in_flight(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.in_flight_tx.subscribe()
    }

    /// Register an application with the instance.
    ///
    /// On success moves to `Registered`, superseding any previous
    /// authorization. On failure the state is left untouched and the error
    /// surfaces to the caller; nothing is retried.
    pub async fn register(&self, client_name: &str, website: &str) -> Result<RegisteredApplication> {
        let generation = self.lock().generation;
        tracing::debug!(instance = %self.instance, client_name, "registering application");

        let request = Request::post("/api/v1/apps").base(&self.base).form(&[
            ("client_name", client_name),
            ("redirect_uris", REDIRECT_URI),
            ("scopes", SCOPES),
            ("website", website),
        ]);
        let application: RegisteredApplication =
            self.executor.execute(&request, &JsonDecoder::new()).await?;

        self.commit(generation, AuthorizationState::Registered(application.clone()))?;
        Ok(application)
    }

    /// URL the user opens in a browser to obtain an authorization code.
    pub fn authorize_url(&self, application: &RegisteredApplication) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&scope={}&redirect_uri={}&response_type=code",
            self.base,
            application.client_id,
            SCOPES.replace(' ', "+"),
            urlencoding::encode(REDIRECT_URI),
        )
    }

    /// Exchange a user-supplied authorization code for a bearer token.
    ///
    /// Requires the machine to be `Registered` with this application. While
    /// the exchange is in flight the overlay timestamp is published for
    /// elapsed-wait display. On success moves to `Authorized`; on failure
    /// the state stays `Registered`.
    pub async fn exchange_token(
        &self,
        application: &RegisteredApplication,
        code: &str,
    ) -> Result<Token> {
        let generation = {
            let inner = self.lock();
            match &inner.state {
                AuthorizationState::Registered(current) if current == application => {
                    inner.generation
                }
                _ => return Err(Error::NotRegistered),
            }
        };

        self.in_flight_tx.send_replace(Some(Utc::now()));
        tracing::debug!(instance = %self.instance, "exchanging authorization code");

        let request = Request::post("/oauth/token").base(&self.base).form(&[
            ("client_id", application.client_id.as_str()),
            ("client_secret", application.client_secret.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("scope", SCOPES),
        ]);
        let result = self.executor.execute(&request, &JsonDecoder::new()).await;
        self.in_flight_tx.send_replace(None);

        let token: Token = result?;
        self.commit(
            generation,
            AuthorizationState::Authorized(application.clone(), token.clone()),
        )?;
        Ok(token)
    }

    /// Reset to `Unauthorized` from any state.
    ///
    /// In-flight calls are not aborted at the transport level; they observe
    /// the generation bump when they complete and discard their responses
    /// instead of committing, so a late success can never re-authorize.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = AuthorizationState::Unauthorized;
        self.state_tx.send_replace(AuthorizationState::Unauthorized);
        self.in_flight_tx.send_replace(None);
    }

    fn commit(&self, generation: u64, next: AuthorizationState) -> Result<()> {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::warn!(instance = %self.instance, "discarding stale authorization response after cancel");
            return Err(Error::Cancelled);
        }
        inner.state = next.clone();
        self.state_tx.send_replace(next);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Never held across an await.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use std::sync::Arc;
    use std::time::Duration;

    const APP_JSON: &str = r#"{"id":"1","name":"roost","client_id":"abc","client_secret":"def"}"#;
    const TOKEN_JSON: &str = r#"{"access_token":"tok","token_type":"Bearer","scope":"read write follow push","created_at":1667568418}"#;

    fn executor() -> Executor {
        Executor::new(Duration::from_secs(5)).unwrap()
    }

    fn authorizer(base: &str) -> Authorizer {
        Authorizer::with_base_url(executor(), Instance::new("127.0.0.1"), base)
    }

    #[tokio::test]
    async fn register_moves_to_registered() {
        let base = testutil::spawn_http(
            vec![testutil::json_response("200 OK", APP_JSON, &[])],
            Duration::ZERO,
        )
        .await;
        let auth = authorizer(&base);

        let app = auth.register("roost", "https://example.org/roost").await.unwrap();
        assert_eq!(app.client_id, "abc");
        assert_eq!(auth.state(), AuthorizationState::Registered(app));
    }

    #[tokio::test]
    async fn failed_register_stays_unauthorized() {
        let base = testutil::spawn_http(
            vec![testutil::json_response(
                "422 Unprocessable Entity",
                r#"{"error":"Validation failed: Name can't be blank"}"#,
                &[],
            )],
            Duration::ZERO,
        )
        .await;
        let auth = authorizer(&base);

        let err = auth.register("", "").await.unwrap_err();
        match err {
            Error::HttpStatus { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("Validation failed"));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
        assert_eq!(auth.state(), AuthorizationState::Unauthorized);
    }

    #[tokio::test]
    async fn exchange_requires_registration() {
        let auth = authorizer("http://127.0.0.1:1");
        let app = RegisteredApplication {
            client_id: "abc".into(),
            client_secret: "def".into(),
        };
        let err = auth.exchange_token(&app, "code").await.unwrap_err();
        assert!(matches!(err, Error::NotRegistered));
    }

    #[tokio::test]
    async fn exchange_moves_to_authorized() {
        let base = testutil::spawn_http(
            vec![
                testutil::json_response("200 OK", APP_JSON, &[]),
                testutil::json_response("200 OK", TOKEN_JSON, &[]),
            ],
            Duration::ZERO,
        )
        .await;
        let auth = authorizer(&base);

        let app = auth.register("roost", "https://example.org/roost").await.unwrap();
        let token = auth.exchange_token(&app, "s3cret-code").await.unwrap();
        assert_eq!(token.access_token, "tok");
        assert!(auth.state().is_authorized());
        assert_eq!(auth.subscribe_in_flight().borrow().as_ref(), None);
    }

    #[tokio::test]
    async fn malformed_token_body_keeps_registered() {
        let base = testutil::spawn_http(
            vec![
                testutil::json_response("200 OK", APP_JSON, &[]),
                testutil::json_response("200 OK", r#"{"token_type":"Bearer"}"#, &[]),
            ],
            Duration::ZERO,
        )
        .await;
        let auth = authorizer(&base);

        let app = auth.register("roost", "https://example.org/roost").await.unwrap();
        let err = auth.exchange_token(&app, "code").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(auth.state(), AuthorizationState::Registered(app));
    }

    #[tokio::test]
    async fn cancel_resets_from_any_state() {
        let base = testutil::spawn_http(
            vec![testutil::json_response("200 OK", APP_JSON, &[])],
            Duration::ZERO,
        )
        .await;
        let auth = authorizer(&base);

        auth.cancel();
        assert_eq!(auth.state(), AuthorizationState::Unauthorized);

        auth.register("roost", "https://example.org/roost").await.unwrap();
        auth.cancel();
        assert_eq!(auth.state(), AuthorizationState::Unauthorized);
    }

    #[tokio::test]
    async fn late_response_after_cancel_is_discarded() {
        testutil::init_tracing();
        let base = testutil::spawn_http(
            vec![testutil::json_response("200 OK", APP_JSON, &[])],
            Duration::from_millis(300),
        )
        .await;
        let auth = Arc::new(authorizer(&base));

        let task = {
            let auth = Arc::clone(&auth);
            tokio::spawn(async move { auth.register("roost", "https://example.org/roost").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(auth.state(), AuthorizationState::Unauthorized);
    }

    #[tokio::test]
    async fn state_changes_are_observable() {
        let base = testutil::spawn_http(
            vec![testutil::json_response("200 OK", APP_JSON, &[])],
            Duration::ZERO,
        )
        .await;
        let auth = authorizer(&base);
        let mut rx = auth.subscribe();

        auth.register("roost", "https://example.org/roost").await.unwrap();
        rx.changed().await.unwrap();
        assert!(matches!(&*rx.borrow(), AuthorizationState::Registered(_)));
    }

    #[test]
    fn authorize_url_carries_oob_redirect() {
        let auth = Authorizer::new(executor(), Instance::new("mastodon.social"));
        let app = RegisteredApplication {
            client_id: "abc".into(),
            client_secret: "def".into(),
        };
        let url = auth.authorize_url(&app);
        assert_eq!(
            url,
            "https://mastodon.social/oauth/authorize?client_id=abc&scope=read+write+follow+push&redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob&response_type=code"
        );
    }
}
