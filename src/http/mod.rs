//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (own task)
//!     → server.rs (hyper connection, Axum router, middleware)
//!     → middleware/cors.rs (preflight answered here; headers on every response)
//!     → server.rs dispatch (proxy prefix or static files)
//!     → proxy.rs (rate limit → auth → upstream.rs)
//!     → response.rs (failures as JSON)
//!     → Send to client
//! ```

pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{client_key, UuidRequestId, X_REQUEST_ID};
pub use response::{json_error, ProxyError};
pub use server::{AppState, HttpServer};
pub use upstream::{UpstreamClient, UpstreamError};
