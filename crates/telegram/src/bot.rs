use std::time::Duration;

use {
    cinebot_config::TelegramConfig,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, Bot, RequestError,
        payloads::GetUpdatesSetters,
        requests::{Request, Requester},
        types::{AllowedUpdate, Update, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{commands::bot_commands, handlers, state::BotContext};

/// Extra HTTP client headroom over the long-polling timeout, so the client
/// never aborts a `getUpdates` before Telegram answers it.
const POLL_CLIENT_HEADROOM_SECS: u64 = 15;
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Build the bot, verify the token, clear any webhook and register the
/// command list.
pub async fn connect(config: &TelegramConfig) -> anyhow::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(
            u64::from(config.poll_timeout_secs) + POLL_CLIENT_HEADROOM_SECS,
        ))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;

    // Long polling is refused while a webhook is set.
    bot.delete_webhook().send().await?;

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!(error = %e, "failed to register bot commands");
    }

    info!(username = ?me.username, "telegram bot connected (webhook cleared)");
    Ok(bot)
}

/// Spawn the long-polling loop.
///
/// Every update is handled in its own task. The loop runs until the returned
/// token is cancelled, or cancels it itself when another instance polls with
/// the same token.
pub fn start_polling(bot: Bot, ctx: BotContext, poll_timeout_secs: u32) -> CancellationToken {
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);

            let result = tokio::select! {
                () = loop_cancel.cancelled() => {
                    info!("telegram polling stopped");
                    break;
                },
                result = request.send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        spawn_update(&ctx, update);
                    }
                },
                Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                    error!("telegram polling disabled: another instance is running with this token");
                    loop_cancel.cancel();
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                },
            }
        }
    });

    cancel
}

fn spawn_update(ctx: &BotContext, update: Update) {
    match update.kind {
        UpdateKind::Message(msg) => {
            debug!(chat_id = msg.chat.id.0, "received telegram message");
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let chat_id = msg.chat.id.0;
                if let Err(e) = handlers::handle_message(&ctx, msg).await {
                    error!(chat_id, error = %e, "error handling telegram message");
                }
            });
        },
        UpdateKind::CallbackQuery(query) => {
            debug!(callback_data = ?query.data, "received telegram callback query");
            let ctx = ctx.clone();
            tokio::spawn(async move {
                if let Err(e) = handlers::handle_callback_query(&ctx, query).await {
                    error!(error = %e, "error handling telegram callback query");
                }
            });
        },
        other => {
            debug!("ignoring non-message update: {other:?}");
        },
    }
}
