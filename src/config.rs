use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// File read when no configuration path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// apiengine - authenticated API client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Settings file (json, toml, yaml); defaults to ./config.json
    #[arg(short, long, env = "APIENGINE_CONFIG")]
    pub config: Option<String>,

    /// Extra settings files overlaid in order on top of --config
    #[arg(short, long)]
    pub merge: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Authenticate and print the token expiry
    Auth {
        /// apiengineUrl:/apiengineUsername:/apienginePassword: overrides
        overrides: Vec<String>,
    },

    /// GET <postfix> and print the response body
    Get {
        postfix: String,
        overrides: Vec<String>,
    },

    /// POST <postfix> with a flat JSON body and print the response body
    Post {
        postfix: String,

        /// Body field as key=value, repeatable
        #[arg(short = 'd', long = "data", value_parser = parse_key_val)]
        data: Vec<(String, String)>,

        overrides: Vec<String>,
    },
}

/// Parse a `key=value` body field
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{}`", s))
}

/// Layered key/value settings read from files.
///
/// Values are looked up by dotted key (`apiengine.url`). A `Settings` value is
/// immutable; overlaying another file produces a new one.
#[derive(Clone, Debug)]
pub struct Settings {
    sources: Vec<PathBuf>,
    raw: config::Config,
}

impl Settings {
    /// Settings with no sources; every lookup yields an empty string
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            raw: config::Config::default(),
        }
    }

    /// Load settings from `path`, or from `config.json` in the working
    /// directory when no path is given.
    ///
    /// A missing default file is not an error: it is logged and empty settings
    /// are returned. A missing explicitly requested file is `NotFound`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::warn!(
                        path = %default.display(),
                        "Config file not found, continuing with empty settings"
                    );
                    return Ok(Self::empty());
                }
                default
            }
        };

        Self::empty().merge(&path)
    }

    /// Overlay `path` on top of the current sources. Later files win per key.
    pub fn merge(&self, path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let mut sources = self.sources.clone();
        sources.push(path.to_path_buf());

        let raw = sources
            .iter()
            .fold(config::Config::builder(), |builder, source| {
                builder.add_source(config::File::from(source.as_path()))
            })
            .build()?;

        tracing::debug!(sources = ?sources, "Settings loaded");

        Ok(Self { sources, raw })
    }

    /// String value for a dotted key, empty when unset
    pub fn get(&self, key: &str) -> String {
        self.raw.get_string(key).unwrap_or_default()
    }

    /// Files that contributed to these settings, in overlay order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::empty()
    }
}

/// Expand tilde (~) in file paths to user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
