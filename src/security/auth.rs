//! Bearer token validation for proxied requests.
//!
//! The check is purely syntactic. The relay never knows whether a token is
//! accepted upstream; it only refuses to forward headers that cannot be one.

/// Scheme prefix required on the `Authorization` header, including the space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Shortest accepted token, in characters.
pub const MIN_TOKEN_LEN: usize = 20;

/// Longest accepted token, in characters.
pub const MAX_TOKEN_LEN: usize = 200;

/// Why an `Authorization` header was refused.
///
/// The `Display` text is returned to the client verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    Missing,

    #[error("Invalid Authorization format")]
    InvalidScheme,

    #[error("Invalid token length")]
    InvalidLength,

    #[error("Invalid token format")]
    InvalidCharacters,
}

/// Validate an `Authorization` header value and return the bearer token.
///
/// Rules are checked in order and the first failure wins: presence, the
/// exact case-sensitive `"Bearer "` prefix, a token length of 20..=200
/// characters, and a token made only of `[A-Za-z0-9_-]`.
pub fn validate_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::Missing),
    };

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::InvalidScheme)?;

    let len = token.chars().count();
    if !(MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&len) {
        return Err(AuthError::InvalidLength);
    }

    if !token.chars().all(is_token_char) {
        return Err(AuthError::InvalidCharacters);
    }

    Ok(token)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
