//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! Every section has defaults, so an empty command line yields a runnable
//! server on port 8003 proxying the usage endpoint.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the relay.
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    /// Listening socket and accept loop settings.
    pub listener: ListenerConfig,

    /// The single upstream API that proxied requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Which request paths are proxied.
    pub proxy: ProxyRouteConfig,

    /// Per-client sliding window limits for proxied requests.
    pub rate_limit: RateLimitConfig,

    /// Directory served for every non-proxied path.
    pub static_files: StaticFilesConfig,

    /// Startup self-check settings.
    pub lifecycle: LifecycleConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Interface address to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind. 0 asks the OS for an ephemeral port.
    pub port: u16,

    /// Upper bound on how long the accept loop waits before re-checking
    /// the shutdown flag, in milliseconds.
    pub accept_poll_ms: u64,

    /// How long in-flight connections may keep running after shutdown
    /// has been requested, in seconds.
    pub drain_timeout_secs: u64,
}

impl ListenerConfig {
    /// The socket address described by `host` and `port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn accept_poll_interval(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8003,
            accept_poll_ms: 500,
            drain_timeout_secs: 30,
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Absolute http(s) URL every proxied request is sent to.
    pub url: String,

    /// User-Agent sent upstream in place of the caller's.
    pub user_agent: String,

    /// Total time allowed for one upstream exchange, in seconds.
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://app.factory.ai/api/organization/members/chat-usage".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Proxy route configuration.
#[derive(Debug, Clone)]
pub struct ProxyRouteConfig {
    /// Plain string prefix; any GET path starting with it is proxied.
    pub path_prefix: String,
}

impl Default for ProxyRouteConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/api/proxy".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per client inside one window.
    pub max_requests: u32,

    /// Sliding window length in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_secs: 60,
        }
    }
}

/// Static file configuration.
#[derive(Debug, Clone)]
pub struct StaticFilesConfig {
    /// Root directory for the file handler.
    pub root: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Probe the listening port once after startup.
    pub self_check: bool,

    /// Delay before the probe connects, in milliseconds.
    pub self_check_delay_ms: u64,

    /// Connect timeout for the probe, in seconds.
    pub self_check_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            self_check: true,
            self_check_delay_ms: 500,
            self_check_timeout_secs: 3,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error, off).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_usage_relay() {
        let config = RelayConfig::default();
        assert_eq!(config.listener.port, 8003);
        assert_eq!(config.rate_limit.max_requests, 30);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(60));
        assert_eq!(config.upstream.timeout(), Duration::from_secs(30));
        assert_eq!(config.listener.accept_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.proxy.path_prefix, "/api/proxy");
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let mut listener = ListenerConfig::default();
        assert_eq!(listener.socket_addr().unwrap(), "0.0.0.0:8003".parse().unwrap());

        listener.host = "::1".to_string();
        listener.port = 9000;
        assert_eq!(listener.socket_addr().unwrap(), "[::1]:9000".parse().unwrap());

        listener.host = "localhost".to_string();
        assert!(listener.socket_addr().is_err());
    }
}
