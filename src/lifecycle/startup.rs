//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Install signal handlers before traffic is accepted
//! - Bind the listener, start serving, launch the self-check
//! - Return only after the server has stopped and the socket is released
//!
//! Any error before serving begins is fatal.

use std::io;

use crate::config::{validate_config, ConfigError, RelayConfig, ValidationError};
use crate::http::{HttpServer, UpstreamError};
use crate::lifecycle::{self_check, signals, Shutdown};
use crate::net::{Listener, ListenerError};

/// Fatal errors that stop the relay from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Run the relay until a termination signal arrives.
pub async fn run(config: RelayConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    signals::install(shutdown.clone()).map_err(StartupError::Signals)?;
    serve(config, shutdown).await
}

/// Run the relay until `shutdown` is triggered.
pub async fn serve(config: RelayConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    validate_config(&config).map_err(ConfigError::from)?;

    let working_dir = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        working_dir = %working_dir,
        static_root = %config.static_files.root.display(),
        upstream = %config.upstream.url,
        rate_limit = config.rate_limit.max_requests,
        rate_window_secs = config.rate_limit.window_secs,
        "cors-relay starting"
    );

    let addr = config
        .listener
        .socket_addr()
        .map_err(|_| ConfigError::from(vec![ValidationError::InvalidHost(config.listener.host.clone())]))?;

    let server = HttpServer::new(config.clone())?;
    let listener = Listener::bind(addr, config.listener.accept_poll_interval())?;
    let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind { addr, source })?;

    tracing::info!(url = %format!("http://localhost:{}", local_addr.port()), "Server started");

    if config.lifecycle.self_check {
        self_check::spawn(local_addr, &config.lifecycle);
    }

    // The listener is moved in and dropped when the accept loop exits.
    server.run(listener, shutdown).await;

    tracing::info!("Cleanup complete, server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn local_config() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.listener.host = "127.0.0.1".to_string();
        config.listener.port = 0;
        config.listener.accept_poll_ms = 20;
        config.lifecycle.self_check = false;
        config
    }

    #[tokio::test]
    async fn invalid_config_is_fatal() {
        let mut config = local_config();
        config.rate_limit.max_requests = 0;

        let err = serve(config, Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(_)), "{err}");
    }

    #[tokio::test]
    async fn port_in_use_is_fatal() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = local_config();
        config.listener.port = taken.local_addr().unwrap().port();

        let err = serve(config, Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Listener(ListenerError::Bind { .. })), "{err}");
    }

    #[tokio::test]
    async fn returns_once_shutdown_is_triggered() {
        let shutdown = Shutdown::new();
        let mut config = local_config();
        config.lifecycle.self_check = true;
        config.lifecycle.self_check_delay_ms = 0;
        let handle = tokio::spawn(serve(config, shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}
