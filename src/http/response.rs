//! Client-facing error responses.
//!
//! # Responsibilities
//! - Map proxy failures to a status code and a short JSON reason
//! - Keep upstream error bodies away from the client
//! - Turn handler panics into a 500 instead of a dropped connection

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::security::AuthError;

/// Body of every error response: `{"error": "<reason>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// JSON error response with `Content-Type: application/json`.
pub fn json_error(status: StatusCode, reason: &str) -> Response {
    (status, Json(ErrorBody { error: reason })).into_response()
}

/// Every way a proxied request can fail. Each variant is terminal.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("rejected authorization header: {0}")]
    Auth(#[from] AuthError),

    #[error("upstream responded with {0}")]
    UpstreamStatus(StatusCode),

    #[error("upstream unreachable: {0}")]
    Unavailable(#[source] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Auth(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamStatus(status) => *status,
            ProxyError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The reason shown to the client. Upstream failures other than 401 all
    /// read the same, whatever the upstream said.
    pub fn client_reason(&self) -> String {
        match self {
            ProxyError::RateLimited => "Too many requests".to_string(),
            ProxyError::Auth(e) => e.to_string(),
            ProxyError::UpstreamStatus(StatusCode::UNAUTHORIZED) => "Unauthorized".to_string(),
            ProxyError::UpstreamStatus(_) => "API request failed".to_string(),
            ProxyError::Unavailable(_) => "Service unavailable".to_string(),
            ProxyError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::RateLimited | ProxyError::Auth(_) => {
                tracing::debug!(error = %self, "Proxy request rejected");
            }
            ProxyError::UpstreamStatus(_) | ProxyError::Unavailable(_) => {
                tracing::warn!(error = %self, "Upstream request failed");
            }
            ProxyError::Internal(_) => {
                tracing::error!(error = %self, "Proxy request failed");
            }
        }
        json_error(self.status(), &self.client_reason())
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
