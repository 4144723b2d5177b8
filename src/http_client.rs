use bytes::Bytes;
use reqwest::{header, Client, Method};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthManager, ClientConfig};
use crate::error::{ClientError, Result};

/// Header carrying the bearer token on every authenticated request
pub const TOKEN_HEADER: &str = "User-Token";

/// Deadline settings for the underlying HTTP client
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Whole-request deadline
    pub request_timeout: Duration,

    /// Connection establishment deadline
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Authenticated API client.
/// Every call obtains a usable token first and sends it in `User-Token`.
pub struct ApiClient {
    /// Shared HTTP client
    client: Client,

    /// Token lifecycle
    auth_manager: Arc<AuthManager>,
}

impl ApiClient {
    /// Create a client for `config` with default deadlines
    pub fn new(config: ClientConfig) -> std::result::Result<Self, reqwest::Error> {
        Self::with_options(config, ClientOptions::default())
    }

    /// Create a client for `config`
    pub fn with_options(
        config: ClientConfig,
        options: ClientOptions,
    ) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()?;

        let auth_manager = Arc::new(AuthManager::new(config, client.clone()));

        Ok(Self {
            client,
            auth_manager,
        })
    }

    /// Token lifecycle shared by this client
    pub fn auth_manager(&self) -> &Arc<AuthManager> {
        &self.auth_manager
    }

    /// Effective connection settings
    pub fn config(&self) -> &ClientConfig {
        self.auth_manager.config()
    }

    /// GET `<base_url><postfix>` and return the raw body
    pub async fn get(&self, postfix: &str) -> Result<Bytes> {
        self.request(Method::GET, postfix, None).await
    }

    /// POST `body` as JSON to `<base_url><postfix>` and return the raw body
    pub async fn post(&self, postfix: &str, body: &HashMap<String, String>) -> Result<Bytes> {
        self.request(Method::POST, postfix, Some(body)).await
    }

    async fn request(
        &self,
        method: Method,
        postfix: &str,
        body: Option<&HashMap<String, String>>,
    ) -> Result<Bytes> {
        let token = self.auth_manager.get_access_token().await.map_err(|e| {
            tracing::warn!(error = %e, "Skipping request, not authenticated");
            ClientError::from(e)
        })?;

        let url = join_url(&self.config().base_url, postfix);
        tracing::debug!(method = %method, url = %url, "Sending HTTP request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(TOKEN_HEADER, token)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, error = %e, "HTTP request failed");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = %status, "Received HTTP response");
        } else {
            tracing::warn!(status = %status, url = %url, "Received error response");
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to read response body");
            ClientError::Read(e)
        })?;

        tracing::trace!(body = %String::from_utf8_lossy(&bytes), "Response body");
        Ok(bytes)
    }
}

/// Join a base URL and a path with exactly one `/` between them
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
