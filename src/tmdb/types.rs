use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A TMDB genre. The id is what discovery queries take; the name is
/// what moods and user-facing filters speak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreListResponse {
    pub genres: Vec<Genre>,
}

/// Discovery sort order, restricted to the allow-list the API accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    #[serde(rename = "vote_average.desc")]
    RatingDesc,
    #[serde(rename = "vote_average.asc")]
    RatingAsc,
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
    #[serde(rename = "release_date.asc")]
    ReleaseDateAsc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::PopularityDesc => "popularity.desc",
            SortOrder::PopularityAsc => "popularity.asc",
            SortOrder::RatingDesc => "vote_average.desc",
            SortOrder::RatingAsc => "vote_average.asc",
            SortOrder::ReleaseDateDesc => "release_date.desc",
            SortOrder::ReleaseDateAsc => "release_date.asc",
        }
    }

    /// Rating-ordered discovery needs a vote-count floor, or obscure
    /// titles with a handful of ratings dominate the results.
    pub fn is_rating_based(&self) -> bool {
        matches!(self, SortOrder::RatingDesc | SortOrder::RatingAsc)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid sort parameter: {0}")]
pub struct InvalidSort(pub String);

impl FromStr for SortOrder {
    type Err = InvalidSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popularity.desc" => Ok(SortOrder::PopularityDesc),
            "popularity.asc" => Ok(SortOrder::PopularityAsc),
            "vote_average.desc" => Ok(SortOrder::RatingDesc),
            "vote_average.asc" => Ok(SortOrder::RatingAsc),
            "release_date.desc" => Ok(SortOrder::ReleaseDateDesc),
            "release_date.asc" => Ok(SortOrder::ReleaseDateAsc),
            other => Err(InvalidSort(other.to_string())),
        }
    }
}

/// Movie shape as TMDB returns it, for both list results and the
/// detail endpoint. List results carry `genre_ids`; details carry
/// `genres` plus whatever `append_to_response` pulled in.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub credits: Option<RawCredits>,
    #[serde(default)]
    pub videos: Option<RawVideos>,
    #[serde(default)]
    pub similar: Option<RawPage>,
    #[serde(default)]
    pub external_ids: Option<RawExternalIds>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<RawMovie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCredits {
    #[serde(default)]
    pub cast: Vec<RawCastMember>,
    #[serde(default)]
    pub crew: Vec<RawCrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVideos {
    #[serde(default)]
    pub results: Vec<RawVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}
