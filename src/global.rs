//! Process-wide client for callers that cannot thread an [`ApiClient`] through.
//!
//! The instance is built lazily on first use from `./config.json` and the
//! process arguments. Unlike [`ApiClient`], `get`/`post` here report a failed
//! authentication as `Ok(None)` rather than an error.

use bytes::Bytes;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth;
use crate::config::Settings;
use crate::error::{ClientError, Result};
use crate::http_client::ApiClient;

struct Shared {
    settings: Settings,
    client: Arc<ApiClient>,
}

static GLOBAL: Lazy<RwLock<Option<Shared>>> = Lazy::new(|| RwLock::new(None));

fn build(settings: Settings) -> Result<Shared> {
    let config = auth::resolve(&settings, std::env::args());
    let client = ApiClient::new(config).map_err(ClientError::Build)?;
    Ok(Shared {
        settings,
        client: Arc::new(client),
    })
}

/// The process-wide client, created on first call
pub async fn instance() -> Result<Arc<ApiClient>> {
    if let Some(shared) = GLOBAL.read().await.as_ref() {
        return Ok(shared.client.clone());
    }

    let mut global = GLOBAL.write().await;
    if let Some(shared) = global.as_ref() {
        return Ok(shared.client.clone());
    }

    let settings = Settings::load(None).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Using empty settings");
        Settings::empty()
    });
    let shared = build(settings)?;
    let client = shared.client.clone();
    *global = Some(shared);
    Ok(client)
}

/// Overlay `path` onto the global settings and rebuild the global client.
///
/// On error the current client and settings stay in place and the error is
/// returned.
pub async fn load_from_config(path: &Path) -> Result<()> {
    let mut global = GLOBAL.write().await;

    let base = match global.as_ref() {
        Some(shared) => shared.settings.clone(),
        None => Settings::load(None).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using empty settings");
            Settings::empty()
        }),
    };

    let shared = base.merge(path).map_err(ClientError::from).and_then(build).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to reload global client");
        e
    })?;

    tracing::info!(path = %path.display(), "Global client reloaded");
    *global = Some(shared);
    Ok(())
}

/// Whether the global client holds, or can obtain, a usable token
pub async fn is_auth() -> bool {
    match instance().await {
        Ok(client) => client.auth_manager().ensure_authenticated().await.is_ok(),
        Err(_) => false,
    }
}

/// GET through the global client; `Ok(None)` when authentication fails
pub async fn get(postfix: &str) -> Result<Option<Bytes>> {
    get_with(&*instance().await?, postfix).await
}

/// POST through the global client; `Ok(None)` when authentication fails
pub async fn post(postfix: &str, body: &HashMap<String, String>) -> Result<Option<Bytes>> {
    post_with(&*instance().await?, postfix, body).await
}

/// GET through `client`, reporting a failed authentication as `Ok(None)`
pub async fn get_with(client: &ApiClient, postfix: &str) -> Result<Option<Bytes>> {
    swallow_auth(client.get(postfix).await)
}

/// POST through `client`, reporting a failed authentication as `Ok(None)`
pub async fn post_with(
    client: &ApiClient,
    postfix: &str,
    body: &HashMap<String, String>,
) -> Result<Option<Bytes>> {
    swallow_auth(client.post(postfix, body).await)
}

fn swallow_auth(result: Result<Bytes>) -> Result<Option<Bytes>> {
    match result {
        Ok(bytes) => Ok(Some(bytes)),
        Err(ClientError::Auth(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
