use std::time::Duration;

use {
    cinebot_config::TmdbConfig,
    secrecy::ExposeSecret,
    serde::de::DeserializeOwned,
    tracing::{debug, error},
};

use crate::{
    discover::{DiscoverQuery, QueryParams},
    error::{Error, Result},
    types::{Genre, GenreList, Movie, MovieList},
};

/// Minimum vote count for the top-rated listing.
pub const TOP_RATED_MIN_VOTES: u32 = 1000;

/// TMDB endpoints used by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    GenreList,
    Popular,
    TopRated,
    SearchMovie,
    DiscoverMovie,
}

impl Endpoint {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::GenreList => "genre/movie/list",
            Self::Popular => "movie/popular",
            Self::TopRated => "movie/top_rated",
            Self::SearchMovie => "search/movie",
            Self::DiscoverMovie => "discover/movie",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Builds public links for catalog records (poster images, movie pages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLinks {
    pub image_base_url: String,
    pub web_base_url: String,
}

impl CatalogLinks {
    #[must_use]
    pub fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}",
            self.image_base_url.trim_end_matches('/'),
            poster_path.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn movie_url(&self, id: u64) -> String {
        format!("{}/{id}", self.web_base_url.trim_end_matches('/'))
    }
}

impl From<&TmdbConfig> for CatalogLinks {
    fn from(config: &TmdbConfig) -> Self {
        Self {
            image_base_url: config.image_base_url.clone(),
            web_base_url: config.web_base_url.clone(),
        }
    }
}

/// HTTP client for the TMDB v3 API.
pub struct TmdbClient {
    http: reqwest::Client,
    config: TmdbConfig,
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("cinebot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &TmdbConfig {
        &self.config
    }

    #[must_use]
    pub fn links(&self) -> CatalogLinks {
        CatalogLinks::from(&self.config)
    }

    /// Add the credential, locale and adult-content exclusion, replacing any
    /// caller-supplied values for those keys.
    fn authorize(&self, mut params: QueryParams) -> QueryParams {
        params.insert("api_key", self.config.api_key.expose_secret());
        params.insert("language", &self.config.language);
        params.insert("include_adult", "false");
        params
    }

    /// Fallible request. Errors never carry the request URL.
    pub async fn try_fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: QueryParams,
    ) -> Result<T> {
        let url = format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            endpoint.path()
        );
        let params = self.authorize(params);

        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!(%endpoint, bytes = body.len(), "tmdb response received");
        serde_json::from_slice(&body).map_err(|source| Error::Decode { endpoint, source })
    }

    /// Fail-soft request: any failure is logged and yields `T::default()`.
    pub async fn fetch<T: DeserializeOwned + Default>(
        &self,
        endpoint: Endpoint,
        params: QueryParams,
    ) -> T {
        match self.try_fetch(endpoint, params).await {
            Ok(value) => value,
            Err(e) => {
                error!(%endpoint, error = %e, "error fetching data from tmdb");
                T::default()
            },
        }
    }

    /// Fallible so the genre cache can report why loading failed.
    pub async fn genres(&self) -> Result<Vec<Genre>> {
        self.try_fetch::<GenreList>(Endpoint::GenreList, QueryParams::new())
            .await
            .map(|list| list.genres)
    }

    pub async fn popular(&self) -> Vec<Movie> {
        self.fetch::<MovieList>(Endpoint::Popular, QueryParams::new())
            .await
            .results
    }

    pub async fn top_rated(&self) -> Vec<Movie> {
        let params = QueryParams::new().with("vote_count.gte", TOP_RATED_MIN_VOTES);
        self.fetch::<MovieList>(Endpoint::TopRated, params)
            .await
            .results
    }

    pub async fn search(&self, query: &str) -> Vec<Movie> {
        let params = QueryParams::new().with("query", query);
        self.fetch::<MovieList>(Endpoint::SearchMovie, params)
            .await
            .results
    }

    pub async fn discover(&self, query: &DiscoverQuery) -> Vec<Movie> {
        self.fetch::<MovieList>(Endpoint::DiscoverMovie, query.params().clone())
            .await
            .results
    }
}
