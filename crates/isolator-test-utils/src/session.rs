//! Per-test session facade.
//!
//! A [`TestSession`] owns one session token for the lifetime of a test. It
//! registers the test's mocks in the shared registry under that token, tags
//! every request it sends with the token, and resets its mocks on demand.
//!
//! # Example
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_user_lookup() -> anyhow::Result<()> {
//!     let mut session = TestSession::new(registry(), &suite())?;
//!     let users = session.register_mock(&mock_user_store);
//!     users.stub_find("alice", r#"{"name":"alice"}"#);
//!
//!     let response = session.get_json("users/alice").await?;
//!     assert_eq!(response, Response::new(200, r#"{"name":"alice"}"#));
//!     Ok(())
//! }
//! ```

use crate::client::{build_http_client, ClientError, IsolatedClient};
use crate::response::Response;
use isolator_common::config::{DEFAULT_CONNECTION_TTL_SECONDS, DEFAULT_MAX_CONNECTIONS};
use isolator_common::{Config, MockFactory, MockHandle, MockRegistry, MockSet, SessionToken};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Per-suite settings every session needs.
///
/// The cookie name is a contract with the service-side router; both sides
/// must agree on it.
pub trait TestSuite {
    /// Name of the cookie carrying the session token.
    fn mock_cookie_name(&self) -> String;

    /// Base URL of the service under test.
    fn test_url(&self) -> String;

    /// Label used in logs.
    fn suite_name(&self) -> String {
        "test-suite".to_string()
    }

    /// Bound on pooled idle connections per host.
    fn max_connections(&self) -> usize {
        DEFAULT_MAX_CONNECTIONS
    }

    /// How long a pooled connection may sit idle before it is closed.
    fn connection_ttl(&self) -> Duration {
        Duration::from_secs(DEFAULT_CONNECTION_TTL_SECONDS)
    }
}

impl TestSuite for Config {
    fn mock_cookie_name(&self) -> String {
        self.cookie_name.clone()
    }

    fn test_url(&self) -> String {
        self.base_url.clone()
    }

    fn max_connections(&self) -> usize {
        self.max_connections
    }

    fn connection_ttl(&self) -> Duration {
        self.connection_ttl
    }
}

/// One test's isolated mock context.
///
/// Dropping the session evicts its mocks from the registry.
pub struct TestSession {
    token: SessionToken,
    registry: Arc<MockRegistry>,
    mocks: MockSet,
    client: IsolatedClient,
}

impl TestSession {
    /// Start a session with a fresh token and its own HTTP client.
    ///
    /// The client's pool follows the suite's `max_connections` and
    /// `connection_ttl`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(registry: Arc<MockRegistry>, suite: &dyn TestSuite) -> Result<Self, ClientError> {
        let pool = Config {
            max_connections: suite.max_connections(),
            connection_ttl: suite.connection_ttl(),
            ..Config::default()
        };
        let http_client = build_http_client(&pool)?;
        Ok(Self::with_http_client(registry, suite, http_client))
    }

    /// Start a session that sends requests through `http_client`.
    ///
    /// Lets many sessions share one connection pool.
    pub fn with_http_client(
        registry: Arc<MockRegistry>,
        suite: &dyn TestSuite,
        http_client: reqwest::Client,
    ) -> Self {
        let token = SessionToken::generate();
        info!(
            target: "isolator.session",
            token = %token,
            suite = %suite.suite_name(),
            "Generating mock session token"
        );
        registry.open_session(&token);

        let client = IsolatedClient::new(
            suite.test_url(),
            suite.mock_cookie_name(),
            token.clone(),
            http_client,
        );

        Self {
            token,
            registry,
            mocks: MockSet::new(),
            client,
        }
    }

    /// This session's token.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Create a mock with `factory` and register it for capability `C`.
    pub fn register_mock<C>(&mut self, factory: &dyn MockFactory<C>) -> Arc<C>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.register_existing(factory.create())
    }

    /// Register an already built mock for capability `C`.
    ///
    /// Replaces any mock this session registered earlier for `C`.
    pub fn register_existing<C>(&mut self, handle: MockHandle<C>) -> Arc<C>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.registry.register(&self.token, &handle);
        self.mocks.push(Arc::clone(handle.resettable()));
        Arc::clone(handle.instance())
    }

    /// Reset every mock this session registered.
    ///
    /// Call before each test case that reuses the session so no stubbing or
    /// call history leaks between cases.
    pub fn reset_all_mocks(&self) {
        self.registry.reset(&self.mocks);
    }

    /// Number of mocks this session has registered (including replaced ones).
    pub fn mock_count(&self) -> usize {
        self.mocks.len()
    }

    /// `GET` a path on the service under test, tagged with this session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on any network or I/O failure.
    pub async fn get_json(&self, path: &str) -> Result<Response, ClientError> {
        self.client.get_json(path).await
    }

    /// `POST` a raw body to the service under test, tagged with this session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on any network or I/O failure.
    pub async fn post_json(
        &self,
        path: &str,
        body: impl Into<String>,
    ) -> Result<Response, ClientError> {
        self.client.post_json(path, body).await
    }

    /// The tagged client, for callers that need it directly.
    pub fn client(&self) -> &IsolatedClient {
        &self.client
    }

    /// The registry this session registers into.
    pub fn registry(&self) -> &Arc<MockRegistry> {
        &self.registry
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        self.registry.evict(&self.token);
    }
}

impl std::fmt::Debug for TestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSession")
            .field("token", &self.token)
            .field("mocks", &self.mocks)
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}
