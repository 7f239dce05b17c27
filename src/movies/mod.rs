pub mod format;
pub mod mood;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

pub use format::{CastMember, CrewMember, MovieDetail, MoviePage, MovieSummary};

use crate::cache::{Category, ResponseCache};
use crate::streaming::{Availability, StreamingClient};
use crate::tmdb::{Genre, SortOrder, TmdbClient};
use crate::upstream::UpstreamError;

// Cache key parameter records, one per operation. Field values are
// normalized (sorted genre ids, lowercased country) before they reach
// key derivation.

#[derive(Serialize)]
struct DiscoverParams {
    genres: Vec<u32>,
    page: u32,
    sort: SortOrder,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    query: &'a str,
    page: u32,
}

#[derive(Serialize)]
struct DetailParams {
    id: u64,
}

#[derive(Serialize)]
struct AvailabilityParams<'a> {
    imdb_id: &'a str,
    country: &'a str,
}

#[derive(Serialize)]
struct NoParams {}

/// Service layer over the upstream clients. Every operation consults
/// the response cache first and stores the translated result on a
/// miss; upstream failures pass through uncached.
pub struct MovieService {
    tmdb: TmdbClient,
    streaming: Option<StreamingClient>,
    cache: ResponseCache,
}

impl MovieService {
    pub fn new(
        tmdb: TmdbClient,
        streaming: Option<StreamingClient>,
        cache: ResponseCache,
    ) -> Self {
        Self {
            tmdb,
            streaming,
            cache,
        }
    }

    pub fn streaming_enabled(&self) -> bool {
        self.streaming.is_some()
    }

    /// Paged recommendations for a mood or an explicit genre list.
    /// A mood takes precedence over genres; with neither, there is
    /// nothing to recommend and the page is empty.
    pub async fn recommendations(
        &self,
        mood: Option<&str>,
        genres: &[String],
        page: u32,
        sort: SortOrder,
    ) -> Result<MoviePage, UpstreamError> {
        let names: Vec<String> = match mood {
            Some(mood) => mood::genres_for_mood(mood)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            None => genres.to_vec(),
        };
        if names.is_empty() {
            return Ok(MoviePage::empty(page));
        }

        let mut genre_ids = self.resolve_genre_ids(&names).await?;
        genre_ids.sort_unstable();
        genre_ids.dedup();
        debug!(?names, ?genre_ids, page, sort = sort.as_str(), "discovering movies");

        let params = DiscoverParams {
            genres: genre_ids.clone(),
            page,
            sort,
        };
        self.cache
            .get_or_fetch(Category::Recommendations, &params, || async {
                let raw = self.tmdb.discover(&genre_ids, page, sort).await?;
                Ok(format::page(raw))
            })
            .await
    }

    pub async fn movie_details(&self, id: u64) -> Result<MovieDetail, UpstreamError> {
        let params = DetailParams { id };
        self.cache
            .get_or_fetch(Category::Details, &params, || async {
                Ok(format::detail(self.tmdb.movie_details(id).await?))
            })
            .await
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<MoviePage, UpstreamError> {
        let params = SearchParams { query, page };
        self.cache
            .get_or_fetch(Category::Search, &params, || async {
                Ok(format::page(self.tmdb.search(query, page).await?))
            })
            .await
    }

    pub async fn genres(&self) -> Result<Vec<Genre>, UpstreamError> {
        self.cache
            .get_or_fetch(Category::Genres, &NoParams {}, || async {
                self.tmdb.genre_list().await
            })
            .await
    }

    /// Streaming availability for a title. Returns empty availability
    /// when no streaming API is configured.
    pub async fn availability(
        &self,
        imdb_id: &str,
        country: &str,
    ) -> Result<Availability, UpstreamError> {
        let Some(streaming) = self.streaming.as_ref() else {
            return Ok(Availability::default());
        };
        let country = country.to_lowercase();
        let params = AvailabilityParams {
            imdb_id,
            country: &country,
        };
        self.cache
            .get_or_fetch(Category::Availability, &params, || async {
                streaming.availability(imdb_id, &country).await
            })
            .await
    }

    pub async fn invalidate_cache(&self, category: Option<Category>) {
        self.cache.invalidate(category).await;
    }

    /// Map genre names to ids through the cached genre list. Names
    /// with no match are dropped, matching is case-insensitive.
    async fn resolve_genre_ids(&self, names: &[String]) -> Result<Vec<u32>, UpstreamError> {
        let genres = self.genres().await?;
        let by_name: HashMap<String, u32> = genres
            .into_iter()
            .map(|g| (g.name.to_lowercase(), g.id))
            .collect();
        Ok(names
            .iter()
            .filter_map(|name| by_name.get(&name.to_lowercase()).copied())
            .collect())
    }
}
