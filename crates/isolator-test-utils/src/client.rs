//! Tagged HTTP client for tests.
//!
//! Every request carries the owning session's token in the agreed cookie
//! and a JSON content type. Each call is a single attempt; transport
//! failures surface to the caller unchanged.

use crate::response::Response;
use isolator_common::{Config, SessionToken};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder};
use std::borrow::Cow;
use thiserror::Error;
use tracing::{debug, instrument};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Build the pooled HTTP client described by `config`.
///
/// Idle connections are capped per host at `max_connections` and closed
/// after `connection_ttl`.
///
/// # Errors
///
/// Returns `ClientError::Transport` if the TLS backend cannot initialise.
pub fn build_http_client(config: &Config) -> Result<Client, ClientError> {
    let client = Client::builder()
        .pool_max_idle_per_host(config.max_connections)
        .pool_idle_timeout(config.connection_ttl)
        .build()?;
    Ok(client)
}

/// Prefix `path` with `/` unless it already starts with one.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    }
}

/// HTTP client bound to one session token.
#[derive(Debug, Clone)]
pub struct IsolatedClient {
    base_url: String,
    cookie_name: String,
    token: SessionToken,
    http_client: Client,
}

impl IsolatedClient {
    /// Create a client tagging requests with `token` in cookie `cookie_name`.
    pub fn new(
        base_url: impl Into<String>,
        cookie_name: impl Into<String>,
        token: SessionToken,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_name: cookie_name.into(),
            token,
            http_client,
        }
    }

    /// Full request target for `path`.
    pub fn request_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, normalize_path(path))
    }

    /// Value of the `Cookie` header attached to every request.
    pub fn cookie_header(&self) -> String {
        format!("{}={}", self.cookie_name, self.token)
    }

    /// `GET <base_url><path>`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on any network or I/O failure.
    pub async fn get_json(&self, path: &str) -> Result<Response, ClientError> {
        let request = self.http_client.get(self.request_url(path));
        self.execute(request).await
    }

    /// `POST <base_url><path>` with `body` sent verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on any network or I/O failure.
    pub async fn post_json(
        &self,
        path: &str,
        body: impl Into<String>,
    ) -> Result<Response, ClientError> {
        let request = self
            .http_client
            .post(self.request_url(path))
            .body(body.into());
        self.execute(request).await
    }

    /// Session token attached to requests.
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Base URL of the service under test.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip_all, fields(token = %self.token))]
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, self.cookie_header())
            .send()
            .await?;

        let code = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await?;

        debug!(target: "isolator.client", url = %url, status = code, "Request completed");

        Ok(Response::new(code, body))
    }
}
