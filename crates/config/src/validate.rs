//! Startup validation of required secrets.

use {secrecy::ExposeSecret, thiserror::Error};

use crate::schema::CinebotConfig;

/// Fatal configuration problems detected before the bot starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not configured")]
    MissingSecret { name: &'static str },
}

/// Check that both the Telegram token and the TMDB API key are present.
///
/// Reports the first missing secret, Telegram first.
pub fn validate(config: &CinebotConfig) -> Result<(), ConfigError> {
    if config.telegram.token.expose_secret().trim().is_empty() {
        return Err(ConfigError::MissingSecret {
            name: "TELEGRAM_BOT_TOKEN",
        });
    }
    if config.tmdb.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::MissingSecret {
            name: "TMDB_API_KEY",
        });
    }
    Ok(())
}
