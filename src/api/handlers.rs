use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use crate::cache::Category;
use crate::movies::{MovieDetail, MoviePage};
use crate::prefs::Preferences;
use crate::server::AppState;
use crate::streaming::Availability;
use crate::tmdb::{Genre, SortOrder};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub mood: Option<String>,
    /// Comma-separated genre names.
    pub genres: Option<String>,
    pub page: Option<u32>,
    pub sort: Option<String>,
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<MoviePage>, ApiError> {
    let sort = match query.sort.as_deref() {
        Some(raw) => raw
            .parse::<SortOrder>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => SortOrder::default(),
    };

    let genres: Vec<String> = query
        .genres
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let page = query.page.unwrap_or(1).max(1);

    let results = state
        .movies
        .recommendations(query.mood.as_deref(), &genres, page, sort)
        .await?;
    Ok(Json(results))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MovieDetail>, ApiError> {
    let detail = state.movies.movie_details(id).await?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub country: Option<String>,
}

pub async fn get_movie_availability(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Availability>, ApiError> {
    let detail = state.movies.movie_details(id).await?;
    let imdb_id = detail
        .imdb_id
        .ok_or_else(|| ApiError::not_found("No IMDB id known for this movie."))?;

    let country = match query.country {
        Some(country) => country,
        None => state.prefs.load().await.country,
    };

    let availability = state.movies.availability(&imdb_id, &country).await?;
    Ok(Json(availability))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub page: Option<u32>,
}

pub async fn search_movies(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<MoviePage>, ApiError> {
    let term = query.query.as_deref().map(str::trim).unwrap_or("");
    if term.is_empty() {
        return Err(ApiError::bad_request("query parameter is required"));
    }
    let page = query.page.unwrap_or(1).max(1);

    let results = state.movies.search(term, page).await?;
    Ok(Json(results))
}

pub async fn get_genres(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, ApiError> {
    let genres = state.movies.genres().await?;
    Ok(Json(genres))
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.prefs.load().await)
}

pub async fn put_preferences(
    State(state): State<AppState>,
    Json(prefs): Json<Preferences>,
) -> Json<Preferences> {
    Json(state.prefs.save(prefs).await)
}

#[derive(Debug, Deserialize)]
pub struct CacheQuery {
    pub category: Option<String>,
}

pub async fn clear_cache(
    State(state): State<AppState>,
    Query(query): Query<CacheQuery>,
) -> Result<StatusCode, ApiError> {
    let category = match query.category.as_deref() {
        Some(raw) => Some(
            raw.parse::<Category>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?,
        ),
        None => None,
    };
    state.movies.invalidate_cache(category).await;
    Ok(StatusCode::NO_CONTENT)
}
