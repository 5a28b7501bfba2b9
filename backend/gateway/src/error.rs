//! Gateway error types and HTTP response handling.

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::headers::apply_defensive_headers;

/// Errors the gateway answers locally, without relaying an upstream body.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid endpoint")]
    InvalidEndpoint,

    #[error("Invalid request body")]
    InvalidBody,

    #[error("Endpoint not allowed")]
    EndpointNotAllowed,

    #[error("Too many requests")]
    RateLimited { retry_after: u64 },

    #[error("Upstream unavailable")]
    UpstreamTimeout,

    #[error("Unexpected upstream contract: {0}")]
    UnexpectedUpstreamContract(String),

    #[error("Internal gateway error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Body of every locally generated error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl GatewayError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidEndpoint | GatewayError::InvalidBody => StatusCode::BAD_REQUEST,
            GatewayError::EndpointNotAllowed => StatusCode::FORBIDDEN,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UnexpectedUpstreamContract(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the caller. Server-side failures collapse into a
    /// generic string; the detail only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::UnexpectedUpstreamContract(_) | GatewayError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.public_message(),
        };

        let mut response = (status, Json(body)).into_response();
        apply_defensive_headers(response.headers_mut());

        if let GatewayError::RateLimited { retry_after } = &self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(*retry_after));
        }

        response
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
