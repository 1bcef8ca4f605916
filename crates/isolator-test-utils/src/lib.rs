//! # Isolator Test Utilities
//!
//! Test-side half of per-test mock isolation.
//!
//! This crate provides:
//! - `TestSession` - owns a session token, registers mocks under it, and
//!   sends tagged requests
//! - `IsolatedClient` - HTTP client that attaches the session cookie
//! - `Response` - status code and body value object
//! - `TestServiceServer` - serves an axum router on a loopback port
//!
//! ## Usage
//!
//! ```rust,ignore
//! use isolator_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let registry = Arc::new(MockRegistry::new());
//!     let server = TestServiceServer::spawn(build_app(registry.clone())).await?;
//!     let config = Config { base_url: server.url(), ..Config::default() };
//!
//!     let mut session = TestSession::new(registry, &config)?;
//!     session.register_mock(&mock_greeter);
//!     session.reset_all_mocks();
//!
//!     let response = session.post_json("users", r#"{"a":1}"#).await?;
//!     assert_eq!(response, Response::new(200, r#"{"a":1}"#));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod response;
pub mod server_harness;
pub mod session;

// Re-export commonly used items
pub use client::{build_http_client, normalize_path, ClientError, IsolatedClient};
pub use response::Response;
pub use server_harness::TestServiceServer;
pub use session::{TestSession, TestSuite};
