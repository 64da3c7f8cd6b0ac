use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::CinebotConfig;

const CONFIG_FILENAME: &str = "cinebot.toml";

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<CinebotConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./cinebot.toml` (project-local)
/// 2. `~/.config/cinebot/cinebot.toml` (user-global)
///
/// Returns `CinebotConfig::default()` if no config file is found or the file
/// cannot be parsed.
pub fn discover_and_load() -> CinebotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    CinebotConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/cinebot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cinebot").map(|d| d.config_dir().to_path_buf())
}
