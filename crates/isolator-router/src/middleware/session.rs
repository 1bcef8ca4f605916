//! Session middleware for isolated routes.
//!
//! Reads the session cookie, parses it into a [`SessionToken`] and stores it
//! in request extensions. Handlers take it explicitly with
//! `Extension<SessionToken>` and pass it down to whatever resolves mocks.

use crate::cookie::find_cookie;
use crate::errors::RouterError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use isolator_common::SessionToken;
use std::sync::Arc;
use tracing::instrument;

/// State for the session middleware.
#[derive(Debug, Clone)]
pub struct SessionLayerState {
    /// Name of the cookie carrying the session token.
    pub cookie_name: String,
}

impl SessionLayerState {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

/// Middleware that requires a valid session cookie.
///
/// # Cookie Format
///
/// ```text
/// Cookie: <cookie_name>=<session token>
/// ```
///
/// # Response
///
/// - Returns 400 Bad Request if the cookie is missing or the token is malformed
/// - Continues to the next handler with the token in extensions otherwise
#[instrument(skip(state, req, next), name = "isolator.middleware.session")]
pub async fn require_session(
    State(state): State<Arc<SessionLayerState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, RouterError> {
    let raw = find_cookie(req.headers(), &state.cookie_name).ok_or_else(|| {
        tracing::debug!(
            target: "isolator.router",
            cookie = %state.cookie_name,
            "Missing session cookie"
        );
        RouterError::MissingSession(state.cookie_name.clone())
    })?;

    let token = SessionToken::parse(raw).map_err(|e| {
        tracing::debug!(target: "isolator.router", error = %e, "Malformed session token");
        RouterError::InvalidSession(e)
    })?;

    req.extensions_mut().insert(token);

    Ok(next.run(req).await)
}

/// Extension trait for reading the session token from a request.
pub trait SessionExt {
    /// Get the session token stored by [`require_session`].
    ///
    /// Returns `None` if the middleware was not applied to this request.
    fn session_token(&self) -> Option<&SessionToken>;
}

impl<B> SessionExt for axum::http::Request<B> {
    fn session_token(&self) -> Option<&SessionToken> {
        self.extensions().get::<SessionToken>()
    }
}
