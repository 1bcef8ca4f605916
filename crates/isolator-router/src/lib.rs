//! Isolator service-side routing.
//!
//! The service under test shares a [`MockRegistry`](isolator_common::MockRegistry)
//! with the test driver. For every inbound request this crate reads the
//! session cookie the driver attached, and hands the token to handlers so
//! they can resolve the calling test's mocks.
//!
//! # Architecture
//!
//! ```text
//! cookie -> middleware::require_session -> Extension<SessionToken>
//!        -> handler -> resolver::MockResolver -> MockRegistry
//! ```
//!
//! # Modules
//!
//! - `cookie` - Cookie header parsing
//! - `errors` - Error types with HTTP status code mapping
//! - `middleware` - Session extraction middleware
//! - `resolver` - Mock lookup for handlers
//! - `routes` - Router wrapping
//! - `tasks` - Background session sweeping

pub mod cookie;
pub mod errors;
pub mod middleware;
pub mod resolver;
pub mod routes;
pub mod tasks;

pub use errors::RouterError;
pub use middleware::{require_session, SessionExt, SessionLayerState};
pub use resolver::MockResolver;
pub use routes::with_session_isolation;
pub use tasks::{start_session_sweeper, SessionSweeperConfig};
