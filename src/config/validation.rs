//! Configuration validation.
//!
//! Serde and clap handle syntax; this module checks that the values make a
//! runnable server. All problems are reported at once, not just the first.

use std::path::PathBuf;

use url::Url;

use crate::config::schema::RelayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener host {0:?} is not an IP address")]
    InvalidHost(String),

    #[error("upstream url {url:?} is invalid: {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("upstream url must use http or https, got scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("proxy path prefix must start with '/', got {0:?}")]
    InvalidPathPrefix(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("static root {} is not a directory", .0.display())]
    StaticRootMissing(PathBuf),

    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

/// Error returned when the assembled configuration cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ValidationError>),
}

impl From<Vec<ValidationError>> for ConfigError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ConfigError::Invalid(errors)
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check every section of `config`.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::InvalidHost(config.listener.host.clone()));
    }
    if config.listener.accept_poll_ms == 0 {
        errors.push(ValidationError::Zero("listener.accept_poll_ms"));
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string())),
        Err(e) => errors.push(ValidationError::InvalidUpstreamUrl {
            url: config.upstream.url.clone(),
            reason: e.to_string(),
        }),
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_secs"));
    }

    if !config.proxy.path_prefix.starts_with('/') {
        errors.push(ValidationError::InvalidPathPrefix(config.proxy.path_prefix.clone()));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::Zero("rate_limit.max_requests"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::Zero("rate_limit.window_secs"));
    }

    if !config.static_files.root.is_dir() {
        errors.push(ValidationError::StaticRootMissing(config.static_files.root.clone()));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
