//! Resolves the mock a handler should call for a given session.
//!
//! Handlers receive the [`SessionToken`] from the session middleware and
//! pass it here explicitly. A miss is always an error; the resolver never
//! falls back to a real dependency.

use crate::errors::RouterError;
use isolator_common::{MockRegistry, SessionToken};
use std::sync::Arc;

/// Mock lookup for request handlers, backed by the shared registry.
#[derive(Debug, Clone)]
pub struct MockResolver {
    registry: Arc<MockRegistry>,
}

impl MockResolver {
    /// Create a resolver over the registry shared with the test driver.
    pub fn new(registry: Arc<MockRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the mock for capability `C` registered under `token`.
    ///
    /// # Errors
    ///
    /// - `RouterError::LookupMiss` - the session registered no such mock
    pub fn resolve<C>(&self, token: &SessionToken) -> Result<Arc<C>, RouterError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.registry.lookup::<C>(token).map_err(|e| {
            tracing::warn!(target: "isolator.router", error = %e, "No mock for tagged request");
            RouterError::from(e)
        })
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<MockRegistry> {
        &self.registry
    }
}
