//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events with structured fields
//!     → logging.rs (fmt subscriber, env filter)
//!     → stdout
//! ```
//!
//! Each HTTP request runs inside a span carrying its method, path and
//! request ID (see `http::server`).

pub mod logging;
