use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::error::AuthError;

use super::exchange;
use super::types::{ClientConfig, Token};

/// Authentication manager
/// Holds the current token and re-authenticates lazily when it is missing or expired
pub struct AuthManager {
    /// Credentials used for the token exchange
    config: ClientConfig,

    /// HTTP client for auth requests
    client: Client,

    /// Current token, empty until the first successful exchange.
    /// The lock is held across the exchange so concurrent callers share one.
    token: Mutex<Option<Token>>,
}

impl AuthManager {
    /// Create a manager with no token held
    pub fn new(config: ClientConfig, client: Client) -> Self {
        Self {
            config,
            client,
            token: Mutex::new(None),
        }
    }

    /// Credentials this manager authenticates with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get a usable token value, authenticating first if none is held or the
    /// held one has expired
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        self.get_access_token_at(Utc::now()).await
    }

    async fn get_access_token_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut slot = self.token.lock().await;

        if let Some(token) = slot.as_ref().filter(|t| t.is_valid_at(now)) {
            return Ok(token.value.clone());
        }

        if slot.take().is_some() {
            tracing::debug!("Token expired, re-authenticating");
        }

        let token = exchange::authenticate(&self.client, &self.config).await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    /// Make sure a usable token is held, authenticating if needed
    pub async fn ensure_authenticated(&self) -> Result<(), AuthError> {
        self.get_access_token().await.map(|_| ())
    }

    /// Force a fresh token exchange, replacing any held token.
    /// On failure no token is held afterwards.
    pub async fn authenticate(&self) -> Result<Token, AuthError> {
        let mut slot = self.token.lock().await;
        *slot = None;

        let token = exchange::authenticate(&self.client, &self.config).await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Whether a usable token is currently held. Never touches the network.
    pub async fn is_authenticated(&self) -> bool {
        let slot = self.token.lock().await;
        slot.as_ref().is_some_and(|t| t.is_valid_at(Utc::now()))
    }

    /// Snapshot of the held token, if any
    pub async fn token(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    /// Install a token obtained elsewhere
    pub async fn set_token(&self, token: Token) {
        *self.token.lock().await = Some(token);
    }

    /// Drop the held token; the next call re-authenticates
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }
}
