//! Response value object returned by every tagged request.

use serde::de::DeserializeOwned;
use std::fmt;

/// Status code and raw body of an HTTP response.
///
/// Compared, hashed and printed by both fields so it can be used directly
/// as an assertion target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Response {
    code: u16,
    body: String,
}

impl Response {
    pub fn new(code: u16, body: impl Into<String>) -> Self {
        Self {
            code,
            body: body.into(),
        }
    }

    /// HTTP status code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Raw body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the status code is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response{{code={}, body={}}}", self.code, self.body)
    }
}
