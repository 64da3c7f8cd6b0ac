use std::sync::Arc;

use cinebot_tmdb::{CatalogLinks, GenreCache, TmdbClient};

use crate::{outbound::ChatOutbound, session::PendingSearches};

/// Everything a handler needs, shared by every update task.
#[derive(Clone)]
pub struct BotContext {
    pub outbound: Arc<dyn ChatOutbound>,
    pub tmdb: Arc<TmdbClient>,
    pub genres: Arc<GenreCache>,
    /// Pending-search flags (std::sync::Mutex inside; never held across
    /// `.await` points).
    pub pending: Arc<PendingSearches>,
    pub links: CatalogLinks,
    /// Release region for discovery queries, from the TMDB config.
    pub region: Option<String>,
}

impl BotContext {
    #[must_use]
    pub fn new(
        outbound: Arc<dyn ChatOutbound>,
        tmdb: Arc<TmdbClient>,
        genres: Arc<GenreCache>,
    ) -> Self {
        let links = tmdb.links();
        let region = tmdb.config().region.clone();
        Self {
            outbound,
            tmdb,
            genres,
            pending: Arc::new(PendingSearches::new()),
            links,
            region,
        }
    }
}

impl std::fmt::Debug for BotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("tmdb", &self.tmdb)
            .field("genres", &self.genres.len())
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
