use crate::upstream::{get_json, UpstreamError};

use super::types::{Genre, GenreListResponse, RawMovie, RawPage, SortOrder};

/// Minimum vote count applied to rating-ordered discovery.
const MIN_VOTE_COUNT: u32 = 100;

/// Thin typed client for the TMDB v3 API.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub async fn genre_list(&self) -> Result<Vec<Genre>, UpstreamError> {
        let url = format!("{}/genre/movie/list", self.base_url);
        let resp: GenreListResponse = get_json(
            self.http
                .get(&url)
                .query(&[("api_key", self.api_key.as_str())]),
        )
        .await?;
        Ok(resp.genres)
    }

    /// Discover movies by genre ids, paged and sorted.
    pub async fn discover(
        &self,
        genre_ids: &[u32],
        page: u32,
        sort: SortOrder,
    ) -> Result<RawPage, UpstreamError> {
        let url = format!("{}/discover/movie", self.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("page", page.to_string()),
            ("sort_by", sort.as_str().to_string()),
            ("include_adult", "false".to_string()),
        ];
        if !genre_ids.is_empty() {
            let with_genres = genre_ids
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            query.push(("with_genres", with_genres));
        }
        if sort.is_rating_based() {
            query.push(("vote_count.gte", MIN_VOTE_COUNT.to_string()));
        }
        get_json(self.http.get(&url).query(&query)).await
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<RawPage, UpstreamError> {
        let url = format!("{}/search/movie", self.base_url);
        let page = page.to_string();
        get_json(self.http.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("query", query),
            ("page", page.as_str()),
            ("include_adult", "false"),
        ]))
        .await
    }

    /// Full movie record with credits, videos, similar titles and
    /// external ids pulled in through one request.
    pub async fn movie_details(&self, id: u64) -> Result<RawMovie, UpstreamError> {
        let url = format!("{}/movie/{}", self.base_url, id);
        get_json(self.http.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("append_to_response", "credits,videos,similar,external_ids"),
        ]))
        .await
    }
}
