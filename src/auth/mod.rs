// Authentication module
// Manages token lifecycle and credential resolution

mod credentials;
mod exchange;
mod manager;
mod types;

pub use credentials::{arg_value, resolve};
pub use exchange::authenticate;
pub use manager::AuthManager;
pub use types::{expires_at, AuthResponse, ClientConfig, Token, EXPIRATION_MARGIN};
