// Username/password token exchange

use chrono::Utc;
use reqwest::Client;

use crate::error::AuthError;
use crate::http_client::join_url;

use super::types::{AuthRequest, AuthResponse, ClientConfig, Token};

/// Path of the token exchange endpoint, relative to the base URL
pub const AUTH_PATH: &str = "auth";

/// Exchange username and password for a token at `<base_url>/auth`
pub async fn authenticate(client: &Client, config: &ClientConfig) -> Result<Token, AuthError> {
    let url = join_url(&config.base_url, AUTH_PATH);
    tracing::debug!(url = %url, username = %config.username, "Requesting token");

    let request = AuthRequest {
        username: &config.username,
        password: &config.password,
    };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(url = %url, error = %e, "Authentication request failed");
            AuthError::Transport(e)
        })?;

    let status = response.status();
    if status.as_u16() >= 300 {
        tracing::error!(status = status.as_u16(), "Authentication rejected");
        return Err(AuthError::Rejected(status.as_u16()));
    }

    let body = response.bytes().await?;
    let now = Utc::now();

    let data: AuthResponse = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body_len = body.len(),
            "Malformed authentication response"
        );
        tracing::trace!(body = %String::from_utf8_lossy(&body), "Authentication response body");
        AuthError::Parse(e)
    })?;

    let token = Token::from_response(data, now);
    tracing::info!(
        "Authenticated as {}, token expires: {}",
        config.username,
        token.expires_at.to_rfc3339()
    );

    Ok(token)
}
