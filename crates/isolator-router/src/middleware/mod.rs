//! Middleware for isolated routes.

pub mod session;

pub use session::{require_session, SessionExt, SessionLayerState};
