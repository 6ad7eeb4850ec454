//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line
//!     → loader.rs (clap flags applied over defaults)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → handed to the server at startup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults; the bare binary runs the usage relay
//! - Validation separates syntactic (clap) from semantic checks
//! - No file format and no reload: config is fixed for the process lifetime

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::Cli;
pub use schema::{
    LifecycleConfig, ListenerConfig, ObservabilityConfig, ProxyRouteConfig, RateLimitConfig,
    RelayConfig, StaticFilesConfig, UpstreamConfig,
};
pub use validation::{validate_config, ConfigError, ValidationError};
