// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    /// The subject never completed the Fitbit OAuth flow.
    #[error("No Fitbit token found. Connect Fitbit first.")]
    NoToken,

    /// Token refresh failed transiently; the stored record is kept so the
    /// caller can retry later.
    #[error("Fitbit connection degraded. Please try again or reconnect.")]
    ConnectionDegraded,

    /// Upstream throttling (HTTP 429). Always surfaced to the caller,
    /// never retried internally.
    #[error("Fitbit API rate limit exceeded")]
    RateLimited {
        retry_after: Option<u64>,
        body: String,
    },

    /// Non-2xx upstream response, or a transport failure (status = None).
    #[error("Fitbit API error (status {status:?}): {body}")]
    Upstream { status: Option<u16>, body: String },

    /// Scoring estimator precondition violation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors that must abort aggregation instead of degrading
    /// to a neutral default.
    pub fn is_fatal_for_aggregation(&self) -> bool {
        matches!(
            self,
            AppError::RateLimited { .. } | AppError::NoToken | AppError::ConnectionDegraded
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details, retry_after) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None, None),
            AppError::NoToken => (
                StatusCode::UNAUTHORIZED,
                "fitbit_not_connected",
                Some(self.to_string()),
                None,
            ),
            AppError::ConnectionDegraded => (
                StatusCode::UNAUTHORIZED,
                "fitbit_connection_degraded",
                Some(self.to_string()),
                None,
            ),
            AppError::RateLimited { retry_after, .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                Some(self.to_string()),
                *retry_after,
            ),
            AppError::Upstream { status, body } => {
                tracing::warn!(upstream_status = ?status, body = %body, "Fitbit upstream error");
                (StatusCode::BAD_GATEWAY, "fitbit_error", None, None)
            }
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_input",
                Some(msg.clone()),
                None,
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                Some(msg.clone()),
                None,
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None, None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            retry_after,
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited {
            retry_after: Some(secs),
            ..
        } = &self
        {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_response_carries_retry_after_header() {
        let err = AppError::RateLimited {
            retry_after: Some(57),
            body: "{}".to_string(),
        };
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("57")
        );
    }

    #[test]
    fn test_no_token_maps_to_unauthorized() {
        let response = AppError::NoToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_fatal_for_aggregation_classification() {
        assert!(AppError::NoToken.is_fatal_for_aggregation());
        assert!(AppError::RateLimited {
            retry_after: None,
            body: String::new()
        }
        .is_fatal_for_aggregation());
        assert!(!AppError::Upstream {
            status: Some(500),
            body: String::new()
        }
        .is_fatal_for_aggregation());
    }
}
