// Effective credentials from settings and process arguments

use crate::config::Settings;

use super::types::ClientConfig;

pub const URL_KEY: &str = "apiengine.url";
pub const USERNAME_KEY: &str = "apiengine.username";
pub const PASSWORD_KEY: &str = "apiengine.password";

pub const URL_ARG: &str = "apiengineUrl";
pub const USERNAME_ARG: &str = "apiengineUsername";
pub const PASSWORD_ARG: &str = "apienginePassword";

/// Resolve the effective client config.
///
/// Settings values are the base. Any argument starting with one of the
/// override prefixes replaces that field with the text after its first `:`;
/// later arguments win.
pub fn resolve<I, S>(settings: &Settings, args: I) -> ClientConfig
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = ClientConfig {
        base_url: settings.get(URL_KEY),
        username: settings.get(USERNAME_KEY),
        password: settings.get(PASSWORD_KEY),
    };

    for arg in args {
        let arg = arg.as_ref();
        if arg.starts_with(URL_ARG) {
            config.base_url = arg_value(arg).to_string();
            tracing::debug!(base_url = %config.base_url, "Base URL overridden from arguments");
        }
        if arg.starts_with(USERNAME_ARG) {
            config.username = arg_value(arg).to_string();
            tracing::debug!(username = %config.username, "Username overridden from arguments");
        }
        if arg.starts_with(PASSWORD_ARG) {
            config.password = arg_value(arg).to_string();
            tracing::debug!("Password overridden from arguments");
        }
    }

    config
}

/// Text after the first `:`, or empty when there is none
pub fn arg_value(arg: &str) -> &str {
    arg.split_once(':').map(|(_, value)| value).unwrap_or("")
}
