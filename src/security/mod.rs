//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request:
//!     → rate_limit.rs (per-client sliding window)
//!     → auth.rs (bearer header syntax)
//!     → Pass to upstream forwarding
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure
//! - Rate limit runs first, so malformed requests still count
//! - No trust in client input; the token is never stored

pub mod auth;
pub mod rate_limit;

pub use auth::{validate_bearer, AuthError};
pub use rate_limit::RateLimiter;
