//! TMDB (The Movie Database) client for cinebot.
//!
//! Wraps the v3 REST API with a fail-soft contract: every typed call returns
//! an empty result instead of an error when the request fails, so callers only
//! ever deal with "data" or "no data".

pub mod client;
pub mod discover;
pub mod error;
pub mod genres;
pub mod types;

pub use {
    client::{CatalogLinks, Endpoint, TmdbClient},
    discover::{DiscoverQuery, QueryParams, SortBy},
    error::{Error, Result},
    genres::GenreCache,
    types::{Genre, GenreList, Movie, MovieList},
};
