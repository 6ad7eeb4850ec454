//! Proxy handler: rate limit, validate, forward, translate.

use std::net::SocketAddr;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap},
    response::{IntoResponse, Response},
};

use crate::http::request::client_key;
use crate::http::response::ProxyError;
use crate::http::server::AppState;
use crate::security::{validate_bearer, AuthError};

/// Handle one proxied GET. Every failure is turned into its JSON response.
pub async fn proxy_handler(state: &AppState, peer: SocketAddr, headers: &HeaderMap) -> Response {
    match relay(state, peer, headers).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn relay(state: &AppState, peer: SocketAddr, headers: &HeaderMap) -> Result<Response, ProxyError> {
    let key = client_key(headers, peer);
    if !state.limiter.check(&key) {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return Err(ProxyError::RateLimited);
    }

    let authorization = headers.get(AUTHORIZATION);
    let header_text = authorization.map(|value| String::from_utf8_lossy(value.as_bytes()));
    validate_bearer(header_text.as_deref())?;
    // Forwarded exactly as received.
    let authorization = authorization.cloned().ok_or(AuthError::Missing)?;

    tracing::debug!(client = %key, upstream = %state.upstream.url(), "Forwarding to upstream");
    let upstream = state.upstream.fetch(authorization).await?;
    Ok(upstream.into_response())
}
