use crate::upstream::{get_json, UpstreamError};

use super::types::{Availability, RawAvailabilityResponse};

/// Client for the RapidAPI streaming-availability service.
pub struct StreamingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    host: String,
}

impl StreamingClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        // RapidAPI routes on the host header, which must match the URL.
        let host = base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            http,
            base_url,
            api_key: api_key.into(),
            host,
        }
    }

    /// Streaming availability for one title in one country. Country
    /// codes are lowercased before the call.
    pub async fn availability(
        &self,
        imdb_id: &str,
        country: &str,
    ) -> Result<Availability, UpstreamError> {
        let url = format!("{}/get", self.base_url);
        let country = country.to_lowercase();
        let resp: RawAvailabilityResponse = get_json(
            self.http
                .get(&url)
                .header("X-RapidAPI-Key", &self.api_key)
                .header("X-RapidAPI-Host", &self.host)
                .query(&[
                    ("imdb_id", imdb_id),
                    ("country", country.as_str()),
                    ("output_language", "en"),
                ]),
        )
        .await?;

        Ok(resp
            .result
            .map(|raw| raw.into_availability())
            .unwrap_or_default())
    }
}
