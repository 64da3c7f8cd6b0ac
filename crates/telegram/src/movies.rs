//! Movie handlers: one function per menu entry, command and callback intent.
//!
//! Every listing follows the same choreography: a transient "processing"
//! message, the TMDB fetch, removal of the transient message, then either a
//! header followed by one message per movie or a single fallback line.

use {
    chrono::NaiveDate,
    cinebot_tmdb::{DiscoverQuery, Genre, Movie},
    rand::{Rng, seq::IndexedRandom},
    teloxide::types::{ChatId, KeyboardRemove, MessageId, ReplyMarkup},
    tracing::{debug, info, warn},
};

use crate::{
    commands::{GENRE_MENU_LIMIT, genre_keyboard, main_menu_keyboard, releases_keyboard},
    error::Result,
    markdown::escape_markdown_v2,
    render::render_movie,
    session::ConversationKey,
    state::BotContext,
};

pub const POPULAR_LIMIT: usize = 5;
pub const TOP_RATED_LIMIT: usize = 5;
pub const SEARCH_LIMIT: usize = 3;
pub const RELEASES_LIMIT: usize = 5;

const HELP_TEXT: &str = concat!(
    "🤖 *Bot commands and features:*\n\n",
    "*Main menu \\(keyboard\\):*\n",
    "  🌟 *Popular:* The most popular movies right now\\.\n",
    "  🏆 *Top Rated:* Movies with the best ratings\\.\n",
    "  📅 *Releases:* This month's releases or the rest of the year\\.\n",
    "  ✨ *Recommend a Movie:* A random pick from a genre you choose\\.\n",
    "  🔍 *Search Movie \\(text\\):* Send a movie title to search for it\\.\n\n",
    "*Other commands:*\n",
    "  `/start` \\- Start the bot and show the main menu\\.\n",
    "  `/help` \\- Show this help\\.\n",
    "  `/search <title>` \\- Search a movie by title\\.\n",
    "  `/close_keyboard` \\- Hide the main keyboard\\.",
);
const SEARCH_USAGE: &str = "Please include a title after the command\\. Example: `/search Matrix`";
const SEARCH_PROMPT: &str = "Ok, now type the name of the movie you want to search for and send it\\. ✍️";
const KEYBOARD_CLOSED: &str = "Main keyboard hidden\\. Show it again with /start\\.";
const GENRES_UNAVAILABLE: &str = "Sorry, genres are not available right now. Try again later. 😕";
const INVALID_SELECTION: &str = "I couldn't process that selection. 😕";
const UNKNOWN_GENRE: &str = "Unknown";

/// The inline-keyboard message a callback came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonOrigin {
    pub callback_id: String,
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseWindow {
    ThisMonth,
    ThisYear,
}

impl ReleaseWindow {
    #[must_use]
    pub fn query(self, today: NaiveDate, region: Option<&str>) -> DiscoverQuery {
        match self {
            Self::ThisMonth => DiscoverQuery::releases_this_month(today, region),
            Self::ThisYear => DiscoverQuery::upcoming_this_year(today, region),
        }
    }

    fn processing(self) -> &'static str {
        match self {
            Self::ThisMonth => "Searching this month's releases... ⏳",
            Self::ThisYear => "Searching upcoming releases... ⏳",
        }
    }

    /// MarkdownV2 header.
    fn header(self) -> &'static str {
        match self {
            Self::ThisMonth => "📅 *This month's releases:*",
            Self::ThisYear => "🗓️ *Upcoming releases this year:*",
        }
    }
}

/// Header and fallback of one listing.
struct Listing {
    /// Already MarkdownV2.
    header: String,
    fallback: String,
    limit: usize,
}

/// Uniform random choice; `None` for an empty slice.
pub fn pick_random<'a, R: Rng + ?Sized>(movies: &'a [Movie], rng: &mut R) -> Option<&'a Movie> {
    movies.choose(rng)
}

// ── Commands ─────────────────────────────────────────────────────────────────

pub async fn start(ctx: &BotContext, chat_id: ChatId, first_name: Option<&str>) -> Result<()> {
    let greeting = match first_name.filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi {name}! 👋 I'm your movie bot."),
        None => "Hi! 👋 I'm your movie bot.".to_string(),
    };
    let text = format!("{greeting}\nPick an option from the keyboard or use /help to see more commands.");
    ctx.outbound
        .send_text(chat_id, &text, Some(main_menu_keyboard().into()))
        .await?;
    Ok(())
}

pub async fn help(ctx: &BotContext, chat_id: ChatId) -> Result<()> {
    ctx.outbound
        .send_markdown(chat_id, HELP_TEXT, Some(remove_keyboard()))
        .await?;
    Ok(())
}

pub async fn close_keyboard(ctx: &BotContext, chat_id: ChatId) -> Result<()> {
    ctx.outbound
        .send_markdown(chat_id, KEYBOARD_CLOSED, Some(remove_keyboard()))
        .await?;
    Ok(())
}

// ── Listings ─────────────────────────────────────────────────────────────────

pub async fn popular(ctx: &BotContext, chat_id: ChatId) -> Result<()> {
    info!(chat_id = chat_id.0, "popular movies requested");
    let listing = Listing {
        header: escape_markdown_v2("🌟 These are the most popular movies right now:"),
        fallback: "I couldn't find popular movies right now. 😕".into(),
        limit: POPULAR_LIMIT,
    };
    let processing = ctx
        .outbound
        .send_text(chat_id, "Searching popular movies... ⏳", None)
        .await?;
    let movies = ctx.tmdb.popular().await;
    discard(ctx, chat_id, processing).await;
    send_listing(ctx, chat_id, &listing, &movies).await
}

pub async fn top_rated(ctx: &BotContext, chat_id: ChatId) -> Result<()> {
    info!(chat_id = chat_id.0, "top rated movies requested");
    let listing = Listing {
        header: escape_markdown_v2("🏆 These are some of the top-rated movies:"),
        fallback: "I couldn't find top-rated movies right now. 😕".into(),
        limit: TOP_RATED_LIMIT,
    };
    let processing = ctx
        .outbound
        .send_text(chat_id, "Searching top-rated movies... ⏳", None)
        .await?;
    let movies = ctx.tmdb.top_rated().await;
    discard(ctx, chat_id, processing).await;
    send_listing(ctx, chat_id, &listing, &movies).await
}

// ── Search ───────────────────────────────────────────────────────────────────

/// `/search <title>`. An empty title gets the usage hint and no lookup.
pub async fn search_command(ctx: &BotContext, chat_id: ChatId, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        ctx.outbound
            .send_markdown(chat_id, SEARCH_USAGE, None)
            .await?;
        return Ok(());
    }
    run_search(ctx, chat_id, query).await
}

/// The search button: the next free-text message becomes a search.
pub async fn request_search(ctx: &BotContext, key: ConversationKey) -> Result<()> {
    ctx.pending.set(key);
    debug!(chat_id = key.chat_id.0, "search pending");
    ctx.outbound
        .send_markdown(key.chat_id, SEARCH_PROMPT, Some(remove_keyboard()))
        .await?;
    Ok(())
}

/// Free text. Searched only when a search was requested; otherwise ignored.
pub async fn search_text(ctx: &BotContext, key: ConversationKey, text: &str) -> Result<()> {
    if !ctx.pending.take(key) {
        debug!(chat_id = key.chat_id.0, "ignoring free text, no search pending");
        return Ok(());
    }
    let query = text.trim();
    if query.is_empty() {
        return Ok(());
    }
    run_search(ctx, key.chat_id, query).await
}

async fn run_search(ctx: &BotContext, chat_id: ChatId, query: &str) -> Result<()> {
    info!(chat_id = chat_id.0, query, "movie search requested");
    let processing_text = format!("Searching for '{query}'... ⏳");
    let listing = Listing {
        header: format!("🔍 *Results for '{}':*", escape_markdown_v2(query)),
        fallback: format!("I couldn't find movies titled '{query}'. 😕"),
        limit: SEARCH_LIMIT,
    };
    let processing = ctx
        .outbound
        .send_text(chat_id, &processing_text, None)
        .await?;
    let movies = ctx.tmdb.search(query).await;
    discard(ctx, chat_id, processing).await;
    send_listing(ctx, chat_id, &listing, &movies).await
}

// ── Releases ─────────────────────────────────────────────────────────────────

pub async fn releases_menu(ctx: &BotContext, chat_id: ChatId) -> Result<()> {
    ctx.outbound
        .send_text(
            chat_id,
            "Choose which releases you want to see:",
            Some(releases_keyboard().into()),
        )
        .await?;
    Ok(())
}

pub async fn releases(
    ctx: &BotContext,
    origin: &ButtonOrigin,
    window: ReleaseWindow,
    today: NaiveDate,
) -> Result<()> {
    info!(chat_id = origin.chat_id.0, ?window, %today, "releases requested");
    acknowledge(ctx, &origin.callback_id).await;
    ctx.outbound
        .edit_text(origin.chat_id, origin.message_id, window.processing())
        .await?;

    let query = window.query(today, ctx.region.as_deref());
    let movies = ctx.tmdb.discover(&query).await;
    discard(ctx, origin.chat_id, origin.message_id).await;

    let listing = Listing {
        header: window.header().to_string(),
        fallback: "I couldn't find releases for this selection. 😕".into(),
        limit: RELEASES_LIMIT,
    };
    send_listing(ctx, origin.chat_id, &listing, &movies).await
}

// ── Recommendations ──────────────────────────────────────────────────────────

pub async fn recommend_menu(ctx: &BotContext, chat_id: ChatId) -> Result<()> {
    let genres: Vec<Genre> = ctx.genres.first(GENRE_MENU_LIMIT);
    if genres.is_empty() {
        warn!(
            chat_id = chat_id.0,
            loaded = ctx.genres.is_loaded(),
            "genre menu requested with no genres available"
        );
        ctx.outbound
            .send_text(chat_id, GENRES_UNAVAILABLE, None)
            .await?;
        return Ok(());
    }
    ctx.outbound
        .send_text(
            chat_id,
            "Choose a genre for your recommendation:",
            Some(genre_keyboard(&genres).into()),
        )
        .await?;
    Ok(())
}

pub async fn recommend(ctx: &BotContext, origin: &ButtonOrigin, genre_id: u32) -> Result<()> {
    acknowledge(ctx, &origin.callback_id).await;

    let genre = ctx
        .genres
        .name(genre_id)
        .unwrap_or_else(|| UNKNOWN_GENRE.to_string());
    info!(chat_id = origin.chat_id.0, genre_id, genre = %genre, "recommendation requested");
    ctx.outbound
        .edit_text(
            origin.chat_id,
            origin.message_id,
            &format!("Looking for a {genre} recommendation... ⏳"),
        )
        .await?;

    let movies = ctx.tmdb.discover(&DiscoverQuery::by_genre(genre_id)).await;
    discard(ctx, origin.chat_id, origin.message_id).await;

    let pick = pick_random(&movies, &mut rand::rng()).cloned();
    match pick {
        Some(movie) => {
            let intro = format!("✨ I recommend this {genre} movie:");
            send_movie(ctx, origin.chat_id, &movie, Some(&intro)).await
        },
        None => {
            let fallback =
                format!("I couldn't find recommendations for the genre {genre} right now. 😕");
            ctx.outbound
                .send_text(origin.chat_id, &fallback, None)
                .await?;
            Ok(())
        },
    }
}

/// A recognized callback whose payload could not be parsed.
pub async fn invalid_selection(ctx: &BotContext, origin: &ButtonOrigin) -> Result<()> {
    acknowledge(ctx, &origin.callback_id).await;
    ctx.outbound
        .edit_text(origin.chat_id, origin.message_id, INVALID_SELECTION)
        .await?;
    Ok(())
}

// ── Sending ──────────────────────────────────────────────────────────────────

async fn send_listing(
    ctx: &BotContext,
    chat_id: ChatId,
    listing: &Listing,
    movies: &[Movie],
) -> Result<()> {
    if movies.is_empty() {
        ctx.outbound
            .send_text(chat_id, &listing.fallback, None)
            .await?;
        return Ok(());
    }

    ctx.outbound
        .send_markdown(chat_id, &listing.header, None)
        .await?;
    for movie in movies.iter().take(listing.limit) {
        send_movie(ctx, chat_id, movie, None).await?;
    }
    Ok(())
}

/// Poster with caption, or the caption alone when there is no poster or the
/// photo is rejected.
pub async fn send_movie(
    ctx: &BotContext,
    chat_id: ChatId,
    movie: &Movie,
    intro: Option<&str>,
) -> Result<()> {
    let rendered = render_movie(movie, intro, &ctx.links);
    if let Some(photo_url) = rendered.photo_url.as_deref() {
        match ctx
            .outbound
            .send_photo(chat_id, photo_url, &rendered.caption)
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => {
                warn!(
                    chat_id = chat_id.0,
                    movie_id = ?movie.id,
                    error = %e,
                    "error sending poster, sending caption as text"
                );
            },
        }
    }
    ctx.outbound
        .send_markdown(chat_id, &rendered.caption, None)
        .await?;
    Ok(())
}

/// Answer a callback query so the client stops its spinner. Stale queries
/// are rejected by Telegram; the failure is logged and otherwise ignored.
pub(crate) async fn acknowledge(ctx: &BotContext, callback_id: &str) {
    if let Err(e) = ctx.outbound.answer_callback(callback_id).await {
        warn!(callback_id, error = %e, "failed to answer callback query");
    }
}

/// Delete a transient message. Failure is logged and otherwise ignored.
async fn discard(ctx: &BotContext, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = ctx.outbound.delete_message(chat_id, message_id).await {
        warn!(
            chat_id = chat_id.0,
            message_id = message_id.0,
            error = %e,
            "failed to delete transient message"
        );
    }
}

fn remove_keyboard() -> ReplyMarkup {
    ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
}
