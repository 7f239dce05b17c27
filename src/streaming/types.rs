use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How a service offers a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferKind {
    Subscription,
    Rent,
    #[serde(other)]
    Other,
}

/// One service's offer for a title, flattened from the upstream shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingOption {
    #[serde(rename = "type")]
    pub kind: OfferKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaving: Option<String>,
}

/// Streaming availability for one title in one country, keyed by
/// lowercased service name. BTreeMap keeps the serialized form stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    pub services: BTreeMap<String, StreamingOption>,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        !self.services.is_empty()
    }

    /// True when the title is offered by any of the preferred services.
    /// With rentals excluded, priced offers do not count.
    pub fn matches_services(&self, services: &[String], include_rentals: bool) -> bool {
        services.iter().any(|service| {
            self.services
                .get(&service.to_lowercase())
                .map_or(false, |offer| include_rentals || offer.price.is_none())
        })
    }

    /// True when any offer leaves the catalog within `days` from now.
    pub fn leaving_within_days(&self, days: i64) -> bool {
        let cutoff = Utc::now().date_naive() + chrono::Duration::days(days);
        self.services.values().any(|offer| {
            offer
                .leaving
                .as_deref()
                .and_then(parse_leaving_date)
                .map_or(false, |date| date <= cutoff)
        })
    }
}

fn parse_leaving_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

// Upstream wire shapes.

#[derive(Debug, Deserialize)]
pub struct RawAvailabilityResponse {
    pub result: Option<RawAvailability>,
}

#[derive(Debug, Deserialize)]
pub struct RawAvailability {
    #[serde(rename = "imdbId", default)]
    pub imdb_id: Option<String>,
    #[serde(rename = "tmdbId", default)]
    pub tmdb_id: Option<u64>,
    #[serde(rename = "streamingInfo", default)]
    pub streaming_info: HashMap<String, Vec<RawOffer>>,
}

#[derive(Debug, Deserialize)]
pub struct RawOffer {
    #[serde(rename = "type")]
    pub kind: OfferKind,
    #[serde(default)]
    pub price: Option<RawPrice>,
    pub link: String,
    #[serde(default)]
    pub leaving: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPrice {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RawAvailability {
    /// Flatten to the translated shape, taking each service's first
    /// offer, the same way the upstream orders its preferred option.
    pub fn into_availability(self) -> Availability {
        let services = self
            .streaming_info
            .into_iter()
            .filter_map(|(service, offers)| {
                let offer = offers.into_iter().next()?;
                let option = StreamingOption {
                    kind: offer.kind,
                    price: offer.price.as_ref().map(|p| p.amount),
                    currency: offer.price.and_then(|p| p.currency),
                    link: offer.link,
                    leaving: offer.leaving,
                };
                Some((service.to_lowercase(), option))
            })
            .collect();
        Availability {
            imdb_id: self.imdb_id,
            tmdb_id: self.tmdb_id,
            services,
        }
    }
}
