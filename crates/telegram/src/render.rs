//! Caption rendering for catalog records.

use cinebot_tmdb::{CatalogLinks, Movie};

use crate::markdown::escape_markdown_v2;

/// Synopsis budget in characters, before the ellipsis.
pub const SYNOPSIS_MAX_CHARS: usize = 250;

const ELLIPSIS: &str = "...";
const MISSING: &str = "N/A";
const NO_OVERVIEW: &str = "No description.";

/// A MarkdownV2-ready caption and the optional poster to attach it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMovie {
    pub caption: String,
    pub photo_url: Option<String>,
}

/// Build the caption for `movie`, optionally preceded by an intro line.
///
/// The whole caption is escaped as one unit, so markup characters inside
/// titles or synopses come out as literal text.
pub fn render_movie(movie: &Movie, intro: Option<&str>, links: &CatalogLinks) -> RenderedMovie {
    RenderedMovie {
        caption: escape_markdown_v2(&caption_text(movie, intro, links)),
        photo_url: movie
            .poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| links.poster_url(p)),
    }
}

/// Unescaped caption text.
pub fn caption_text(movie: &Movie, intro: Option<&str>, links: &CatalogLinks) -> String {
    let mut lines = Vec::with_capacity(6);
    if let Some(intro) = intro.filter(|i| !i.is_empty()) {
        lines.push(intro.to_string());
    }
    lines.push(format!("🎬 {}", non_empty(movie.title.as_deref(), MISSING)));
    lines.push(format!(
        "🗓️ Release: {}",
        non_empty(movie.release_date.as_deref(), MISSING)
    ));
    lines.push(format!(
        "⭐ Rating: {:.1}/10",
        movie.vote_average.unwrap_or_default()
    ));
    lines.push(format!("📝 Synopsis: {}", synopsis(movie.overview.as_deref())));
    if let Some(id) = movie.id {
        lines.push(format!("🔗 View on TMDB: {}", links.movie_url(id)));
    }
    lines.join("\n")
}

/// First [`SYNOPSIS_MAX_CHARS`] characters followed by `...`.
///
/// The ellipsis is appended even when nothing was cut.
pub fn synopsis(overview: Option<&str>) -> String {
    let text = non_empty(overview, NO_OVERVIEW);
    let mut out: String = text.chars().take(SYNOPSIS_MAX_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}

fn non_empty<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}
