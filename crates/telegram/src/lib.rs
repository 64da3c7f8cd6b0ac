//! Telegram front-end for cinebot.
//!
//! Receives updates through teloxide long polling, routes them to the movie
//! handlers, and renders TMDB records as MarkdownV2 captions with posters.

pub mod bot;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod markdown;
pub mod movies;
pub mod outbound;
pub mod render;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use {
    error::{Error, Result},
    outbound::{ChatOutbound, TelegramOutbound},
    state::BotContext,
};
