mod client;
mod types;

pub use client::StreamingClient;
pub use types::{Availability, OfferKind, StreamingOption};

/// Default streaming-availability API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://streaming-availability.p.rapidapi.com";
