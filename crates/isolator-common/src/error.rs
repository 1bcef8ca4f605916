//! Common error types for Isolator components.

use crate::types::{CapabilityId, SessionToken};
use thiserror::Error;

/// Errors raised by the mock registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No mock is registered for the `(token, capability)` pair.
    ///
    /// Always a hard failure: it means the test and the service disagree
    /// about which mocks exist. Callers must not fall back to a real
    /// dependency.
    #[error("No mock registered for capability {capability} in session {token}")]
    LookupMiss {
        token: SessionToken,
        capability: CapabilityId,
    },
}

/// Errors raised when parsing an externally supplied session token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token was empty.
    #[error("Session token must not be empty")]
    Empty,

    /// The token contains characters that cannot travel in a cookie value.
    #[error("Session token contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Result type alias using `RegistryError`
pub type Result<T> = std::result::Result<T, RegistryError>;
