use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::upstream::UpstreamError;

/// Client-facing error: a status code plus a JSON `{"error": ...}`
/// body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        let status = match &err {
            UpstreamError::NotFound { .. } => StatusCode::NOT_FOUND,
            UpstreamError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            // Upstream credentials are server configuration, not
            // something the client can fix; don't relay 401.
            UpstreamError::Unauthorized { .. }
            | UpstreamError::Status { .. }
            | UpstreamError::Network(_)
            | UpstreamError::Decode(_) => StatusCode::BAD_GATEWAY,
        };
        let message = match &err {
            UpstreamError::NotFound { .. } => "The requested resource was not found.".to_string(),
            UpstreamError::RateLimited { .. } => {
                "Too many requests, please try again shortly.".to_string()
            }
            UpstreamError::Network(_) => {
                "Unable to reach the movie data service. Please try again later.".to_string()
            }
            _ => "An error occurred while fetching data. Please try again later.".to_string(),
        };
        warn!(error = %err, upstream_status = ?err.status(), "upstream request failed");
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_status_mapping() {
        let cases = [
            (UpstreamError::NotFound { message: None }, StatusCode::NOT_FOUND),
            (
                UpstreamError::RateLimited { message: None },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                UpstreamError::Unauthorized {
                    status: 401,
                    message: None,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                UpstreamError::Status {
                    status: 503,
                    message: None,
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }
}
