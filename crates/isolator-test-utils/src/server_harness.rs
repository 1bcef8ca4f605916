//! Test server harness for end-to-end isolation tests.
//!
//! Provides `TestServiceServer` for serving an axum router on a loopback port.

use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing::error;

/// Test harness that serves a router on a random local port.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ping() -> Result<()> {
///     let app = with_session_isolation(build_routes(registry.clone()), "mock_session");
///     let server = TestServiceServer::spawn(app).await?;
///
///     let config = Config { base_url: server.url(), ..Config::default() };
///     let session = TestSession::new(registry, &config)?;
///     assert_eq!(session.get_json("ping").await?.code(), 200);
///     Ok(())
/// }
/// ```
pub struct TestServiceServer {
    addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestServiceServer {
    /// Serve `app` in the background.
    ///
    /// Binds to `127.0.0.1:0`, so concurrent tests never compete for a port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(app: axum::Router) -> Result<Self, anyhow::Error> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(target: "isolator.harness", error = %e, "Test server error");
            }
        });

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Base URL of the running server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServiceServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
