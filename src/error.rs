// Error handling module
// Defines the error taxonomy for settings, authentication and requests

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading settings files.
///
/// These are soft failures: callers log them and continue with empty settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A file exists but could not be read or parsed
    #[error("Config file could not be parsed: {0}")]
    Parse(#[from] config::ConfigError),
}

/// Errors from the `/auth` token exchange
#[derive(Error, Debug)]
pub enum AuthError {
    /// The exchange never produced a response, or its body could not be read
    #[error("Authentication request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The auth endpoint answered with a status of 300 or above
    #[error("Authentication rejected with status {0}")]
    Rejected(u16),

    /// The auth endpoint answered 2xx with a body that is not a token response
    #[error("Authentication response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors from authenticated GET/POST calls
#[derive(Error, Debug)]
pub enum ClientError {
    /// No usable token could be obtained
    #[error("Not authenticated: {0}")]
    Auth(#[from] AuthError),

    /// The request could not be sent or no response arrived
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response arrived but its body could not be read
    #[error("Failed to read response body: {0}")]
    Read(#[source] reqwest::Error),

    /// The underlying HTTP client could not be constructed; nothing was sent
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// Settings could not be loaded while (re)building a client
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// True when the call failed before any request was sent because
    /// authentication did not succeed
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
