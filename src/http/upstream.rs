//! Forwarding to the fixed upstream API.
//!
//! Exactly one GET per proxied request. No retries: the first outcome is
//! the final one.

use axum::{
    body::{Body, Bytes},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use reqwest::Url;

use crate::config::UpstreamConfig;
use crate::http::response::ProxyError;

/// Error building the upstream client at startup.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid upstream url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid upstream user agent {0:?}")]
    InvalidUserAgent(String),

    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A successful upstream answer, relayed to the client as a 200.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub content_type: HeaderValue,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, self.content_type)],
            Body::from(self.body),
        )
            .into_response()
    }
}

/// Shared client for the upstream endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    url: Url,
    user_agent: HeaderValue,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let url = Url::parse(&config.url).map_err(|source| UpstreamError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| UpstreamError::InvalidUserAgent(config.user_agent.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            url,
            user_agent,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send one GET upstream carrying only `authorization` and the fixed
    /// User-Agent.
    ///
    /// - 2xx: content type (default `application/json`) and body bytes
    /// - any other status: [`ProxyError::UpstreamStatus`], body discarded
    /// - no response at all: [`ProxyError::Unavailable`]
    /// - body read failure: [`ProxyError::Internal`]
    pub async fn fetch(&self, authorization: HeaderValue) -> Result<UpstreamResponse, ProxyError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(AUTHORIZATION, authorization)
            .header(USER_AGENT, self.user_agent.clone())
            .send()
            .await
            .map_err(ProxyError::Unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Internal(format!("reading upstream body: {e}")))?;

        tracing::debug!(status = %status, bytes = body.len(), "Upstream responded");
        Ok(UpstreamResponse { content_type, body })
    }
}
