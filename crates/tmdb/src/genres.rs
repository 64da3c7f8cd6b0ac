//! Process-wide genre id → name mapping.

use std::sync::{
    RwLock,
    atomic::{AtomicBool, Ordering},
};

use tracing::{error, info, warn};

use crate::{client::TmdbClient, types::Genre};

/// Genre mapping loaded once at startup and read by many handlers.
///
/// Single writer (`replace`), many readers. The lock is never held across
/// `.await` points.
#[derive(Debug, Default)]
pub struct GenreCache {
    genres: RwLock<Vec<Genre>>,
    loaded: AtomicBool,
}

impl GenreCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the genre list and replace the mapping.
    ///
    /// Returns `false` (mapping untouched) when the request failed or TMDB
    /// returned no genres.
    pub async fn load(&self, client: &TmdbClient) -> bool {
        let genres = match client.genres().await {
            Ok(genres) => genres,
            Err(e) => {
                error!(error = %e, "could not load movie genres");
                return false;
            },
        };
        if genres.is_empty() {
            warn!("tmdb returned an empty genre list");
            return false;
        }
        let count = genres.len();
        self.replace(genres);
        info!(count, "movie genres loaded");
        true
    }

    /// Atomically swap in a complete mapping.
    pub fn replace(&self, genres: Vec<Genre>) {
        let mut guard = self.genres.write().unwrap_or_else(|e| e.into_inner());
        *guard = genres;
        self.loaded.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn name(&self, id: u32) -> Option<String> {
        let guard = self.genres.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().find(|g| g.id == id).map(|g| g.name.clone())
    }

    /// The first `n` genres in API order.
    #[must_use]
    pub fn first(&self, n: usize) -> Vec<Genre> {
        let guard = self.genres.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().take(n).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genres.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
