use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use apiengine::auth;
use apiengine::config::{expand_tilde, CliArgs, Command, Settings};
use apiengine::{ApiClient, ClientOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();

    // Initialize logging with the configured level
    let log_level = args.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let settings = load_settings(&args);

    // Overrides may appear anywhere on the command line
    let client_config = auth::resolve(&settings, std::env::args());
    tracing::debug!(config = ?client_config, "Resolved client config");

    let client = ApiClient::with_options(
        client_config,
        ClientOptions {
            request_timeout: Duration::from_secs(args.timeout),
            connect_timeout: Duration::from_secs(args.connect_timeout),
        },
    )
    .context("Failed to create HTTP client")?;

    match args.command {
        Command::Auth { .. } => {
            let token = client
                .auth_manager()
                .authenticate()
                .await
                .context("Authentication failed")?;
            println!("authenticated, token expires {}", token.expires_at.to_rfc3339());
        }
        Command::Get { postfix, .. } => {
            let body = client
                .get(&postfix)
                .await
                .with_context(|| format!("GET {} failed", postfix))?;
            write_body(&body)?;
        }
        Command::Post { postfix, data, .. } => {
            let body: HashMap<String, String> = data.into_iter().collect();
            let response = client
                .post(&postfix, &body)
                .await
                .with_context(|| format!("POST {} failed", postfix))?;
            write_body(&response)?;
        }
    }

    Ok(())
}

/// Read the settings stack. Failures are logged and never abort startup.
fn load_settings(args: &CliArgs) -> Settings {
    let path = args.config.as_deref().map(expand_tilde);

    let mut settings = Settings::load(path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Continuing with empty settings");
        Settings::empty()
    });

    for overlay in &args.merge {
        let overlay = expand_tilde(overlay);
        match settings.merge(&overlay) {
            Ok(merged) => settings = merged,
            Err(e) => tracing::warn!(path = %overlay.display(), error = %e, "Skipping config overlay"),
        }
    }

    tracing::info!(sources = ?settings.sources(), "Settings ready");
    settings
}

fn write_body(body: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(body).context("Failed to write response body")?;
    if !body.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
