// apiengine - authenticated API client library

pub mod auth;
pub mod config;
pub mod error;
pub mod global;
pub mod http_client;

pub use crate::auth::{AuthManager, ClientConfig, Token};
pub use crate::config::Settings;
pub use crate::error::{AuthError, ClientError, ConfigError};
pub use crate::http_client::{ApiClient, ClientOptions};
