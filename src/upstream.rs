use std::time::Duration;

use serde::de::DeserializeOwned;

/// Errors from the upstream metadata and availability APIs.
///
/// Upstream failures are never cached; they always propagate to the
/// HTTP layer, which maps them onto client-facing status codes.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("rate limited by upstream service")]
    RateLimited { message: Option<String> },
    #[error("upstream rejected credentials (status {status})")]
    Unauthorized { status: u16, message: Option<String> },
    #[error("resource not found upstream")]
    NotFound { message: Option<String> },
    #[error("upstream returned status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("network error talking to upstream")]
    Network(#[source] reqwest::Error),
    #[error("failed to decode upstream response")]
    Decode(#[source] reqwest::Error),
}

impl UpstreamError {
    /// The upstream HTTP status, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::RateLimited { .. } => Some(429),
            UpstreamError::Unauthorized { status, .. } => Some(*status),
            UpstreamError::NotFound { .. } => Some(404),
            UpstreamError::Status { status, .. } => Some(*status),
            UpstreamError::Network(_) | UpstreamError::Decode(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            UpstreamError::RateLimited { message }
            | UpstreamError::Unauthorized { message, .. }
            | UpstreamError::NotFound { message }
            | UpstreamError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Send a GET request and decode the JSON body, translating non-2xx
/// statuses into the error taxonomy above.
pub async fn get_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
) -> Result<T, UpstreamError> {
    let resp = req.send().await.map_err(UpstreamError::Network)?;
    let status = resp.status();

    if !status.is_success() {
        let message = extract_message(resp.text().await.ok().as_deref());
        return Err(match status.as_u16() {
            401 | 403 => UpstreamError::Unauthorized {
                status: status.as_u16(),
                message,
            },
            404 => UpstreamError::NotFound { message },
            429 => UpstreamError::RateLimited { message },
            code => UpstreamError::Status {
                status: code,
                message,
            },
        });
    }

    resp.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            UpstreamError::Decode(e)
        } else {
            UpstreamError::Network(e)
        }
    })
}

// TMDB wraps errors as {"status_message": ...}, RapidAPI as {"message": ...}.
fn extract_message(body: Option<&str>) -> Option<String> {
    let body = body?.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["status_message", "message", "error"] {
            if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                return Some(msg.to_string());
            }
        }
    }
    Some(body.chars().take(200).collect())
}
