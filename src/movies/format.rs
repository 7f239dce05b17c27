use serde::{Deserialize, Serialize};

use crate::tmdb::{RawMovie, RawPage};

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const POSTER_SIZE: &str = "w342";
const BACKDROP_SIZE: &str = "w1280";
const PROFILE_SIZE: &str = "w185";

/// TMDB reports page counts beyond what it will actually serve; pages
/// past 500 return errors, so the count is clamped.
const MAX_PAGES: u32 = 500;

const CAST_LIMIT: usize = 10;
const KEY_CREW_JOBS: &[&str] = &["Director", "Writer", "Producer"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetail {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<String>,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    pub similar: Vec<MovieSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub results: Vec<MovieSummary>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl MoviePage {
    pub fn empty(page: u32) -> Self {
        Self {
            results: Vec::new(),
            current_page: page,
            total_pages: 0,
        }
    }
}

fn image_url(path: Option<&str>, size: &str) -> Option<String> {
    path.map(|p| format!("{IMAGE_BASE_URL}/{size}{p}"))
}

fn release_year(release_date: Option<&str>) -> Option<i32> {
    let year = release_date?.get(..4)?;
    year.parse().ok()
}

pub fn summarize(raw: &RawMovie) -> MovieSummary {
    MovieSummary {
        id: raw.id,
        title: raw.title.clone(),
        overview: raw.overview.clone(),
        poster_path: image_url(raw.poster_path.as_deref(), POSTER_SIZE),
        backdrop_path: image_url(raw.backdrop_path.as_deref(), BACKDROP_SIZE),
        release_date: raw.release_date.clone(),
        release_year: release_year(raw.release_date.as_deref()),
        vote_average: raw.vote_average,
        genres: raw.genres.iter().map(|g| g.name.clone()).collect(),
    }
}

pub fn page(raw: RawPage) -> MoviePage {
    MoviePage {
        results: raw.results.iter().map(summarize).collect(),
        current_page: raw.page,
        total_pages: raw.total_pages.min(MAX_PAGES),
    }
}

pub fn detail(raw: RawMovie) -> MovieDetail {
    let trailer = raw.videos.as_ref().and_then(|videos| {
        videos
            .results
            .iter()
            .find(|v| v.site == "YouTube" && v.kind == "Trailer")
            .map(|v| v.key.clone())
    });

    let mut cast = Vec::new();
    let mut crew = Vec::new();
    if let Some(credits) = &raw.credits {
        let mut billed: Vec<_> = credits.cast.iter().collect();
        billed.sort_by_key(|c| c.order.unwrap_or(u32::MAX));
        cast = billed
            .into_iter()
            .take(CAST_LIMIT)
            .map(|c| CastMember {
                name: c.name.clone(),
                character: c.character.clone(),
                profile_path: image_url(c.profile_path.as_deref(), PROFILE_SIZE),
            })
            .collect();
        crew = credits
            .crew
            .iter()
            .filter_map(|c| {
                let job = c.job.as_deref()?;
                KEY_CREW_JOBS.contains(&job).then(|| CrewMember {
                    name: c.name.clone(),
                    job: job.to_string(),
                })
            })
            .collect();
    }

    let similar = raw
        .similar
        .as_ref()
        .map(|page| page.results.iter().map(summarize).collect())
        .unwrap_or_default();

    MovieDetail {
        id: raw.id,
        title: raw.title.clone(),
        overview: raw.overview.clone(),
        poster_path: image_url(raw.poster_path.as_deref(), POSTER_SIZE),
        backdrop_path: image_url(raw.backdrop_path.as_deref(), BACKDROP_SIZE),
        release_date: raw.release_date.clone(),
        release_year: release_year(raw.release_date.as_deref()),
        runtime: raw.runtime,
        vote_average: raw.vote_average,
        vote_count: raw.vote_count,
        tagline: raw.tagline.clone(),
        status: raw.status.clone(),
        imdb_id: raw.external_ids.as_ref().and_then(|e| e.imdb_id.clone()),
        genres: raw.genres.iter().map(|g| g.name.clone()).collect(),
        trailer,
        cast,
        crew,
        similar,
    }
}
