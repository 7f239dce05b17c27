mod client;
mod types;

pub use client::TmdbClient;
pub use types::{
    Genre, InvalidSort, RawCastMember, RawCredits, RawCrewMember, RawExternalIds, RawMovie,
    RawPage, RawVideo, RawVideos, SortOrder,
};

/// Default TMDB API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
