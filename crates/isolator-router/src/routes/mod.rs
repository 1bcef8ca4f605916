//! Router composition for isolated services.

use crate::middleware::{require_session, SessionLayerState};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Wrap an application router so every request must carry a session cookie.
///
/// Adds:
/// - `require_session` - resolves the session token into request extensions
/// - TraceLayer for request logging
///
/// Layer order (bottom-to-top execution):
/// 1. Session middleware (innermost)
/// 2. TraceLayer
pub fn with_session_isolation(router: Router, cookie_name: impl Into<String>) -> Router {
    let state = Arc::new(SessionLayerState::new(cookie_name));

    router
        .layer(middleware::from_fn_with_state(state, require_session))
        .layer(TraceLayer::new_for_http())
}
