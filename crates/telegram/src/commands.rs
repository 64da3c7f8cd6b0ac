//! Dispatch table: slash commands, reply-keyboard labels and callback payloads.
//!
//! Raw update text is parsed once here into closed enums; handlers match on
//! those exhaustively.

use std::str::FromStr;

use {
    cinebot_tmdb::Genre,
    teloxide::types::{
        BotCommand, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    },
    thiserror::Error,
};

/// Genres offered in the recommendation menu.
pub const GENRE_MENU_LIMIT: usize = 12;
const GENRE_BUTTONS_PER_ROW: usize = 2;

const RELEASES_MONTH: &str = "releases_month";
const RELEASES_YEAR: &str = "releases_year";
const RECOMMEND_GENRE_PREFIX: &str = "recommend_genre_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/search <title>`; the title may be empty.
    Search(String),
    CloseKeyboard,
}

/// Persistent reply-keyboard buttons, matched by exact label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuButton {
    Popular,
    TopRated,
    Releases,
    Recommend,
    Search,
}

impl MenuButton {
    pub const ALL: [Self; 5] = [
        Self::Popular,
        Self::TopRated,
        Self::Releases,
        Self::Recommend,
        Self::Search,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Popular => "🌟 Popular",
            Self::TopRated => "🏆 Top Rated",
            Self::Releases => "📅 Releases",
            Self::Recommend => "✨ Recommend a Movie",
            Self::Search => "🔍 Search Movie (text)",
        }
    }

    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == text)
    }
}

/// What an inbound text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    Menu(MenuButton),
    /// Free text; only meaningful while a search is pending.
    Text(String),
    UnknownCommand(String),
}

/// Classify an inbound text message.
pub fn route_message(text: &str) -> Route {
    if let Some(button) = MenuButton::from_label(text) {
        return Route::Menu(button);
    }

    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix('/') else {
        return Route::Text(text.to_string());
    };

    let (head, args) = match body.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (body, ""),
    };
    // `/search@my_bot` addresses a specific bot in groups.
    let name = head.split('@').next().unwrap_or(head);

    match name {
        "start" => Route::Command(Command::Start),
        "help" => Route::Command(Command::Help),
        "search" => Route::Command(Command::Search(args.to_string())),
        "close_keyboard" => Route::Command(Command::CloseKeyboard),
        other => Route::UnknownCommand(other.to_string()),
    }
}

/// Inline-keyboard callback intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackIntent {
    ViewReleasesThisMonth,
    ViewReleasesThisYear,
    RecommendGenre(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackParseError {
    #[error("unknown callback payload: {0}")]
    Unknown(String),

    #[error("invalid genre id in callback payload: {0}")]
    InvalidGenreId(String),
}

impl FromStr for CallbackIntent {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            RELEASES_MONTH => Ok(Self::ViewReleasesThisMonth),
            RELEASES_YEAR => Ok(Self::ViewReleasesThisYear),
            _ => match data.strip_prefix(RECOMMEND_GENRE_PREFIX) {
                Some(id) => id
                    .parse()
                    .map(Self::RecommendGenre)
                    .map_err(|_| CallbackParseError::InvalidGenreId(data.to_string())),
                None => Err(CallbackParseError::Unknown(data.to_string())),
            },
        }
    }
}

impl CallbackIntent {
    /// Callback data carried by the inline button.
    #[must_use]
    pub fn payload(self) -> String {
        match self {
            Self::ViewReleasesThisMonth => RELEASES_MONTH.to_string(),
            Self::ViewReleasesThisYear => RELEASES_YEAR.to_string(),
            Self::RecommendGenre(id) => format!("{RECOMMEND_GENRE_PREFIX}{id}"),
        }
    }
}

/// Commands registered with `setMyCommands` for client autocomplete.
#[must_use]
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot and show the main menu"),
        BotCommand::new("help", "Show available commands"),
        BotCommand::new("search", "Search a movie by title"),
        BotCommand::new("close_keyboard", "Hide the main keyboard"),
    ]
}

#[must_use]
pub fn main_menu_keyboard() -> KeyboardMarkup {
    let row = |buttons: &[MenuButton]| -> Vec<KeyboardButton> {
        buttons.iter().map(|b| KeyboardButton::new(b.label())).collect()
    };
    KeyboardMarkup::new(vec![
        row(&[MenuButton::Popular, MenuButton::TopRated]),
        row(&[MenuButton::Releases, MenuButton::Recommend]),
        row(&[MenuButton::Search]),
    ])
    .resize_keyboard()
}

#[must_use]
pub fn releases_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "This month's releases",
            CallbackIntent::ViewReleasesThisMonth.payload(),
        )],
        vec![InlineKeyboardButton::callback(
            "Upcoming releases (this year)",
            CallbackIntent::ViewReleasesThisYear.payload(),
        )],
    ])
}

/// Two genre buttons per row.
#[must_use]
pub fn genre_keyboard(genres: &[Genre]) -> InlineKeyboardMarkup {
    let rows = genres
        .chunks(GENRE_BUTTONS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|g| {
                    InlineKeyboardButton::callback(
                        g.name.clone(),
                        CallbackIntent::RecommendGenre(g.id).payload(),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, teloxide::types::InlineKeyboardButtonKind};

    #[rstest]
    #[case("/start", Route::Command(Command::Start))]
    #[case("/help", Route::Command(Command::Help))]
    #[case("/close_keyboard", Route::Command(Command::CloseKeyboard))]
    #[case("/search Matrix", Route::Command(Command::Search("Matrix".into())))]
    #[case(
        "/search   El viaje de Chihiro  ",
        Route::Command(Command::Search("El viaje de Chihiro".into()))
    )]
    #[case("/search", Route::Command(Command::Search(String::new())))]
    #[case("/search@cine_bot Alien", Route::Command(Command::Search("Alien".into())))]
    #[case("/unknown", Route::UnknownCommand("unknown".into()))]
    #[case("🌟 Popular", Route::Menu(MenuButton::Popular))]
    #[case("🔍 Search Movie (text)", Route::Menu(MenuButton::Search))]
    #[case("🌟 popular", Route::Text("🌟 popular".into()))]
    #[case("Blade Runner", Route::Text("Blade Runner".into()))]
    fn routes_messages(#[case] text: &str, #[case] expected: Route) {
        assert_eq!(route_message(text), expected);
    }

    #[test]
    fn every_menu_label_round_trips() {
        for button in MenuButton::ALL {
            assert_eq!(MenuButton::from_label(button.label()), Some(button));
        }
    }

    #[rstest]
    #[case("releases_month", Ok(CallbackIntent::ViewReleasesThisMonth))]
    #[case("releases_year", Ok(CallbackIntent::ViewReleasesThisYear))]
    #[case("recommend_genre_28", Ok(CallbackIntent::RecommendGenre(28)))]
    #[case(
        "recommend_genre_abc",
        Err(CallbackParseError::InvalidGenreId("recommend_genre_abc".into()))
    )]
    #[case(
        "recommend_genre_",
        Err(CallbackParseError::InvalidGenreId("recommend_genre_".into()))
    )]
    #[case("sessions_switch:1", Err(CallbackParseError::Unknown("sessions_switch:1".into())))]
    fn parses_callback_payloads(
        #[case] data: &str,
        #[case] expected: Result<CallbackIntent, CallbackParseError>,
    ) {
        assert_eq!(data.parse::<CallbackIntent>(), expected);
    }

    fn callback_data(button: &InlineKeyboardButton) -> Option<&str> {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.as_str()),
            _ => None,
        }
    }

    #[test]
    fn genre_keyboard_pairs_buttons() {
        let genres: Vec<Genre> = (1..=5)
            .map(|id| Genre {
                id,
                name: format!("g{id}"),
            })
            .collect();
        let markup = genre_keyboard(&genres);
        let shape: Vec<usize> = markup.inline_keyboard.iter().map(Vec::len).collect();
        assert_eq!(shape, vec![2, 2, 1]);
        assert_eq!(
            callback_data(&markup.inline_keyboard[2][0]),
            Some("recommend_genre_5")
        );
        assert_eq!(markup.inline_keyboard[0][1].text, "g2");
    }

    #[test]
    fn releases_keyboard_payloads_parse_back() {
        let markup = releases_keyboard();
        let intents: Vec<CallbackIntent> = markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(callback_data)
            .map(|d| d.parse().unwrap())
            .collect();
        assert_eq!(intents, vec![
            CallbackIntent::ViewReleasesThisMonth,
            CallbackIntent::ViewReleasesThisYear,
        ]);
    }

    #[test]
    fn main_menu_uses_button_labels() {
        let markup = main_menu_keyboard();
        let labels: Vec<&str> = markup
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(
            labels,
            MenuButton::ALL.iter().map(|b| b.label()).collect::<Vec<_>>()
        );
    }
}
