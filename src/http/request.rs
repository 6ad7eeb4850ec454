//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) for requests that arrive without one
//! - Derive the rate limit key for a client

use std::net::SocketAddr;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The key a request is rate limited under.
///
/// The first entry of `X-Forwarded-For` when there is a usable one,
/// otherwise the peer IP. Not authenticated: a client can pick its own key.
pub fn client_key(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "192.0.2.7:51000".parse().unwrap()
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn falls_back_to_peer_ip_without_port() {
        assert_eq!(client_key(&HeaderMap::new(), peer()), "192.0.2.7");
    }

    #[test]
    fn uses_first_forwarded_entry() {
        assert_eq!(
            client_key(&forwarded(" 203.0.113.9 , 10.0.0.1, 10.0.0.2"), peer()),
            "203.0.113.9"
        );
        assert_eq!(client_key(&forwarded("198.51.100.1"), peer()), "198.51.100.1");
    }

    #[test]
    fn empty_forwarded_header_is_ignored() {
        assert_eq!(client_key(&forwarded(""), peer()), "192.0.2.7");
        assert_eq!(client_key(&forwarded(" , 10.0.0.1"), peer()), "192.0.2.7");
    }

    #[test]
    fn non_ascii_forwarded_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_bytes(b"\xff\xfe").unwrap());
        assert_eq!(client_key(&headers, peer()), "192.0.2.7");
    }

    #[test]
    fn request_ids_are_unique_uuids() {
        let request = Request::new(());
        let mut make = UuidRequestId;
        let a = make.make_request_id(&request).unwrap();
        let b = make.make_request_id(&request).unwrap();

        let a = a.header_value().to_str().unwrap().to_owned();
        let b = b.header_value().to_str().unwrap().to_owned();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
