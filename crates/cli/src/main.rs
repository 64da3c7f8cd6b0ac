use std::{path::PathBuf, process::ExitCode, sync::Arc};

use {
    cinebot_config::{CinebotConfig, discover_and_load, load_config, validate},
    cinebot_telegram::{BotContext, TelegramOutbound, bot},
    cinebot_tmdb::{GenreCache, TmdbClient},
    clap::Parser,
    secrecy::Secret,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "cinebot", about = "cinebot: Telegram movie bot backed by TMDB", version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file (default: ./cinebot.toml, then the user config dir).
    #[arg(long, env = "CINEBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Telegram bot token (overrides config value).
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// TMDB API key (overrides config value).
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    tmdb_api_key: Option<String>,

    /// TMDB response language, e.g. es-ES (overrides config value).
    #[arg(long)]
    language: Option<String>,

    /// Release region for discovery, e.g. ES; empty for worldwide (overrides
    /// config value).
    #[arg(long)]
    region: Option<String>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// CLI and environment values win over the config file.
fn apply_overrides(config: &mut CinebotConfig, cli: &Cli) {
    if let Some(token) = cli.telegram_token.as_deref().filter(|t| !t.is_empty()) {
        config.telegram.token = Secret::new(token.to_string());
    }
    if let Some(key) = cli.tmdb_api_key.as_deref().filter(|k| !k.is_empty()) {
        config.tmdb.api_key = Secret::new(key.to_string());
    }
    if let Some(language) = &cli.language {
        config.tmdb.language.clone_from(language);
    }
    if let Some(region) = &cli.region {
        config.tmdb.region = Some(region.clone()).filter(|r| !r.is_empty());
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };
    apply_overrides(&mut config, &cli);
    validate(&config)?;

    let tmdb = Arc::new(TmdbClient::new(config.tmdb.clone())?);
    let genres = Arc::new(GenreCache::new());
    {
        let tmdb = Arc::clone(&tmdb);
        let genres = Arc::clone(&genres);
        tokio::spawn(async move {
            genres.load(&tmdb).await;
        });
    }

    let telegram = bot::connect(&config.telegram).await?;
    let outbound = Arc::new(TelegramOutbound::new(telegram.clone()));
    let ctx = BotContext::new(outbound, tmdb, genres);
    let cancel = bot::start_polling(telegram, ctx, config.telegram.poll_timeout_secs);

    info!("cinebot running, press Ctrl+C to stop");
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutting down");
        },
        () = cancel.cancelled() => {
            anyhow::bail!("telegram polling stopped");
        },
    }
    cancel.cancel();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "cinebot starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory, secrecy::ExposeSecret};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cinebot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_values() {
        let cli = parse(&[
            "--telegram-token",
            "123:abc",
            "--tmdb-api-key",
            "k3y",
            "--language",
            "en-US",
            "--region",
            "MX",
        ]);
        let mut config = CinebotConfig::default();
        config.telegram.token = Secret::new("from-file".into());

        apply_overrides(&mut config, &cli);

        assert_eq!(config.telegram.token.expose_secret(), "123:abc");
        assert_eq!(config.tmdb.api_key.expose_secret(), "k3y");
        assert_eq!(config.tmdb.language, "en-US");
        assert_eq!(config.tmdb.region.as_deref(), Some("MX"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn empty_region_means_worldwide() {
        let cli = parse(&["--region", ""]);
        let mut config = CinebotConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.tmdb.region, None);
    }

    #[test]
    fn empty_secret_flag_keeps_file_value() {
        let cli = parse(&["--tmdb-api-key", ""]);
        let mut config = CinebotConfig::default();
        config.tmdb.api_key = Secret::new("from-file".into());
        apply_overrides(&mut config, &cli);
        assert_eq!(config.tmdb.api_key.expose_secret(), "from-file");
    }
}
