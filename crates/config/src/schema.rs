use {secrecy::Secret, serde::Deserialize};

/// Root of `cinebot.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CinebotConfig {
    pub telegram: TelegramConfig,
    pub tmdb: TmdbConfig,
}

/// Telegram bot settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather. Usually provided via `TELEGRAM_BOT_TOKEN`.
    pub token: Secret<String>,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
        }
    }
}

/// TMDB metadata API settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// API key (v3 auth). Usually provided via `TMDB_API_KEY`.
    pub api_key: Secret<String>,

    /// Response locale sent as `language` on every request.
    pub language: String,

    /// Release region used by discovery queries. `None` means worldwide.
    pub region: Option<String>,

    pub api_base_url: String,

    /// Prefix joined with a record's `poster_path`.
    pub image_base_url: String,

    /// Prefix joined with `/{id}` to link a movie page.
    pub web_base_url: String,

    /// HTTP client timeout (seconds).
    pub timeout_secs: u64,
}

impl std::fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_key", &"[REDACTED]")
            .field("language", &self.language)
            .field("region", &self.region)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::new(String::new()),
            language: "es-ES".into(),
            region: Some("ES".into()),
            api_base_url: "https://api.themoviedb.org/3".into(),
            image_base_url: "https://image.tmdb.org/t/p/w500".into(),
            web_base_url: "https://www.themoviedb.org/movie".into(),
            timeout_secs: 10,
        }
    }
}
