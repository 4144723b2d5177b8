// Authentication types

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of the server-declared token lifetime we actually rely on.
/// Tokens are renewed once this share of their lifetime has elapsed.
pub const EXPIRATION_MARGIN: f64 = 0.9;

/// Effective connection settings for one client
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token issued by the auth endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Build a token from an auth response received at `now`
    pub fn from_response(response: AuthResponse, now: DateTime<Utc>) -> Self {
        Self {
            value: response.result,
            expires_at: expires_at(now, response.expiration_seconds),
        }
    }

    /// A token is usable only while non-empty and strictly before its expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && now < self.expires_at
    }
}

/// Expiry instant for a lifetime of `expiration_seconds` starting at `now`,
/// shortened by `EXPIRATION_MARGIN` and truncated to whole seconds.
///
/// Lifetimes past the representable range clamp to `MAX_UTC` (or `MIN_UTC`
/// for negative ones).
pub fn expires_at(now: DateTime<Utc>, expiration_seconds: i64) -> DateTime<Utc> {
    let seconds = (expiration_seconds as f64 * EXPIRATION_MARGIN) as i64;
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(if seconds < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// `/auth` request body
#[derive(Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// `/auth` response body
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub result: String,
    pub expiration_seconds: i64,
}
