//! Authenticated HTTP access shared by the index and blob store transports.
//!
//! Every request carries `X-Data-User` and `X-Data-Token`. Status codes map
//! onto error kinds: 2xx/3xx succeed, 404 is [`DataError::NotFound`], any
//! other 4xx/5xx is [`DataError::Transport`] with the server's message.

use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

use crate::error::{DataError, Result};

pub const HEADER_USER: &str = "X-Data-User";
pub const HEADER_TOKEN: &str = "X-Data-Token";
pub const CONTENT_TYPE_YAML: &str = "application/yaml";

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("data/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    user: String,
    token: String,
}

impl HttpClient {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            user: user.into(),
            token: token.into(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("http {} {}", method, url);
        self.client
            .request(method, url)
            .header(HEADER_USER, &self.user)
            .header(HEADER_TOKEN, &self.token)
    }

    /// Send `req` and map failures onto error kinds. `what` names the
    /// resource in a [`DataError::NotFound`].
    pub(crate) async fn send(&self, req: RequestBuilder, url: &str, what: &str) -> Result<Response> {
        let resp = req.send().await.map_err(|e| {
            if e.is_connect() {
                DataError::Network {
                    url: url.to_string(),
                    source: e,
                }
            } else {
                DataError::Http(e)
            }
        })?;

        let status = resp.status();
        if status.is_success() || status.is_redirection() {
            return Ok(resp);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::NotFound(what.to_string()));
        }

        let message = resp.text().await.unwrap_or_default().trim().to_string();
        Err(DataError::Transport {
            status: status.as_u16(),
            message,
        })
    }
}
