use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        ApiError, Bot, RequestError,
        payloads::{SendMessageSetters, SendPhotoSetters},
        requests::Requester,
        types::{ChatId, InputFile, MessageId, ParseMode, ReplyMarkup},
    },
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Everything the movie handlers send back to a chat.
///
/// Implemented by [`TelegramOutbound`] for the live bot and by a recording
/// double in tests.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    /// Plain text, no parse mode.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId>;

    /// Text that is already valid MarkdownV2.
    async fn send_markdown(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId>;

    /// Photo by URL with a MarkdownV2 caption.
    async fn send_photo(&self, chat_id: ChatId, photo_url: &str, caption: &str)
    -> Result<MessageId>;

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}

/// Bot API sender. Rate-limited requests are retried after the wait
/// Telegram asks for.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn run_with_retry<T, F, Fut>(
        &self,
        chat_id: ChatId,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id = chat_id.0,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        chat_id = chat_id.0,
                        operation,
                        retries,
                        max_retries = TELEGRAM_RETRY_AFTER_MAX_RETRIES,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn is_message_not_modified_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

#[async_trait]
impl ChatOutbound for TelegramOutbound {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId> {
        let message = self
            .run_with_retry(chat_id, "send message", || {
                let mut req = self.bot.send_message(chat_id, text);
                if let Some(markup) = markup.clone() {
                    req = req.reply_markup(markup);
                }
                async move { req.await }
            })
            .await?;
        debug!(chat_id = chat_id.0, text_len = text.len(), "telegram text sent");
        Ok(message.id)
    }

    async fn send_markdown(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId> {
        let message = self
            .run_with_retry(chat_id, "send message (markdown)", || {
                let mut req = self
                    .bot
                    .send_message(chat_id, text)
                    .parse_mode(ParseMode::MarkdownV2);
                if let Some(markup) = markup.clone() {
                    req = req.reply_markup(markup);
                }
                async move { req.await }
            })
            .await?;
        debug!(
            chat_id = chat_id.0,
            text_len = text.len(),
            "telegram markdown sent"
        );
        Ok(message.id)
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
    ) -> Result<MessageId> {
        let url: reqwest::Url = photo_url
            .parse()
            .map_err(|e| Error::photo_url(photo_url, e))?;
        let message = self
            .run_with_retry(chat_id, "send photo", || {
                let req = self
                    .bot
                    .send_photo(chat_id, InputFile::url(url.clone()))
                    .caption(caption)
                    .parse_mode(ParseMode::MarkdownV2);
                async move { req.await }
            })
            .await?;
        debug!(
            chat_id = chat_id.0,
            caption_len = caption.len(),
            "telegram photo sent"
        );
        Ok(message.id)
    }

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        match self
            .run_with_retry(chat_id, "edit message", || {
                let req = self.bot.edit_message_text(chat_id, message_id, text);
                async move { req.await }
            })
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_message_not_modified_error(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.run_with_retry(chat_id, "delete message", || {
            let req = self.bot.delete_message(chat_id, message_id);
            async move { req.await }
        })
        .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let req = self.bot.answer_callback_query(callback_id);
        req.await?;
        Ok(())
    }
}
