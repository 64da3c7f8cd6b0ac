//! Configuration loading and validation for cinebot.
//!
//! Config file: `cinebot.toml`, searched in `./` then `~/.config/cinebot/`.
//! Secrets are normally supplied through the environment and override any
//! value found in the file.

pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{CinebotConfig, TelegramConfig, TmdbConfig},
    validate::{ConfigError, validate},
};
