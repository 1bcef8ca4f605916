//! Common data types for Isolator components.

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Opaque identifier of one test's isolated mock context.
///
/// Generated once per test session and never reused. The same value travels
/// to the service under test in a cookie, so it is restricted to
/// cookie-safe characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a new random session token (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        let token = Self(Uuid::new_v4().to_string());
        tracing::debug!(target: "isolator.session", token = %token, "Generated session token");
        token
    }

    /// Parse a token received from the wire.
    ///
    /// # Errors
    ///
    /// - `TokenError::Empty` - the value is empty
    /// - `TokenError::InvalidCharacter` - the value holds whitespace, control
    ///   characters or cookie separators
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        if raw.is_empty() {
            return Err(TokenError::Empty);
        }

        if let Some(c) = raw
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | ',' | '"' | '\\'))
        {
            return Err(TokenError::InvalidCharacter(c));
        }

        Ok(Self(raw.to_string()))
    }

    /// Raw token value, as sent in the session cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionToken {
    type Error = TokenError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed identifier of a mocked capability.
///
/// Derived from the `TypeId` of the capability type, which is usually a
/// trait object such as `dyn UserStore`. The type name is kept only for
/// diagnostics; equality and hashing ignore it.
#[derive(Clone, Copy)]
pub struct CapabilityId {
    type_id: TypeId,
    name: &'static str,
}

impl CapabilityId {
    /// Identifier for capability type `C`.
    #[must_use]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// Human-readable type name of the capability.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for CapabilityId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CapabilityId {}

impl Hash for CapabilityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityId").field(&self.name).finish()
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
