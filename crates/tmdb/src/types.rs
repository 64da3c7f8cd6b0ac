use serde::Deserialize;

/// A catalog record as returned by list, search and discovery endpoints.
///
/// Every field is optional because TMDB omits or nulls them freely.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub overview: Option<String>,
    /// ISO date (`YYYY-MM-DD`) or an empty string for unreleased titles.
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub poster_path: Option<String>,
}

/// List response. Only the first page is ever read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MovieList {
    pub results: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// `genre/movie/list` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenreList {
    pub genres: Vec<Genre>,
}
