//! Update routing: extract what the handlers need from teloxide updates and
//! hand it to the matching function in [`crate::movies`].

use {
    chrono::{Local, NaiveDate},
    teloxide::types::{CallbackQuery, ChatId, Message, MessageId, UserId},
    tracing::{debug, info},
};

use crate::{
    commands::{CallbackIntent, CallbackParseError, Command, MenuButton, Route, route_message},
    error::Result,
    movies::{self, ButtonOrigin, ReleaseWindow},
    session::ConversationKey,
    state::BotContext,
};

/// An inbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
    pub first_name: Option<String>,
    pub text: String,
}

impl InboundText {
    /// `None` for anything that is not a text message.
    #[must_use]
    pub fn from_message(msg: &Message) -> Option<Self> {
        let text = msg.text()?;
        Some(Self {
            chat_id: msg.chat.id,
            user_id: msg.from.as_ref().map(|u| u.id),
            first_name: msg.from.as_ref().map(|u| u.first_name.clone()),
            text: text.to_string(),
        })
    }

    #[must_use]
    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(self.chat_id, self.user_id)
    }
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCallback {
    pub id: String,
    pub data: Option<String>,
    /// Chat and message carrying the pressed button.
    pub message: Option<(ChatId, MessageId)>,
}

impl InboundCallback {
    #[must_use]
    pub fn from_query(query: &CallbackQuery) -> Self {
        Self {
            id: query.id.clone(),
            data: query.data.clone(),
            message: query.message.as_ref().map(|m| (m.chat().id, m.id())),
        }
    }

    fn origin(&self) -> Option<ButtonOrigin> {
        self.message.map(|(chat_id, message_id)| ButtonOrigin {
            callback_id: self.id.clone(),
            chat_id,
            message_id,
        })
    }
}

/// Handle one inbound message from the polling loop.
pub async fn handle_message(ctx: &BotContext, msg: Message) -> Result<()> {
    let Some(inbound) = InboundText::from_message(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    dispatch_text(ctx, inbound).await
}

pub async fn dispatch_text(ctx: &BotContext, inbound: InboundText) -> Result<()> {
    let chat_id = inbound.chat_id;
    match route_message(&inbound.text) {
        Route::Command(Command::Start) => {
            movies::start(ctx, chat_id, inbound.first_name.as_deref()).await
        },
        Route::Command(Command::Help) => movies::help(ctx, chat_id).await,
        Route::Command(Command::Search(query)) => {
            movies::search_command(ctx, chat_id, &query).await
        },
        Route::Command(Command::CloseKeyboard) => movies::close_keyboard(ctx, chat_id).await,
        Route::Menu(MenuButton::Popular) => movies::popular(ctx, chat_id).await,
        Route::Menu(MenuButton::TopRated) => movies::top_rated(ctx, chat_id).await,
        Route::Menu(MenuButton::Releases) => movies::releases_menu(ctx, chat_id).await,
        Route::Menu(MenuButton::Recommend) => movies::recommend_menu(ctx, chat_id).await,
        Route::Menu(MenuButton::Search) => movies::request_search(ctx, inbound.key()).await,
        Route::Text(text) => movies::search_text(ctx, inbound.key(), &text).await,
        Route::UnknownCommand(name) => {
            debug!(chat_id = chat_id.0, command = %name, "ignoring unknown command");
            Ok(())
        },
    }
}

/// Handle one callback query from the polling loop.
pub async fn handle_callback_query(ctx: &BotContext, query: CallbackQuery) -> Result<()> {
    let inbound = InboundCallback::from_query(&query);
    dispatch_callback(ctx, inbound, Local::now().date_naive()).await
}

pub async fn dispatch_callback(
    ctx: &BotContext,
    inbound: InboundCallback,
    today: NaiveDate,
) -> Result<()> {
    let Some(data) = inbound.data.as_deref() else {
        movies::acknowledge(ctx, &inbound.id).await;
        return Ok(());
    };
    let Some(origin) = inbound.origin() else {
        debug!(data, "callback without an accessible message");
        movies::acknowledge(ctx, &inbound.id).await;
        return Ok(());
    };

    match data.parse::<CallbackIntent>() {
        Ok(CallbackIntent::ViewReleasesThisMonth) => {
            movies::releases(ctx, &origin, ReleaseWindow::ThisMonth, today).await
        },
        Ok(CallbackIntent::ViewReleasesThisYear) => {
            movies::releases(ctx, &origin, ReleaseWindow::ThisYear, today).await
        },
        Ok(CallbackIntent::RecommendGenre(genre_id)) => {
            movies::recommend(ctx, &origin, genre_id).await
        },
        Err(e @ CallbackParseError::InvalidGenreId(_)) => {
            info!(chat_id = origin.chat_id.0, error = %e, "malformed genre selection");
            movies::invalid_selection(ctx, &origin).await
        },
        Err(e @ CallbackParseError::Unknown(_)) => {
            debug!(chat_id = origin.chat_id.0, error = %e, "ignoring callback");
            movies::acknowledge(ctx, &origin.callback_id).await;
            Ok(())
        },
    }
}
