//! Post-start listener probe.
//!
//! Connects once to the local listening port and logs the outcome. It does
//! not touch the serving path and nothing waits on it.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::LifecycleConfig;

/// Where to connect to reach a listener bound at `local`.
pub fn probe_target(local: SocketAddr) -> SocketAddr {
    match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), local.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), local.port())
        }
        _ => local,
    }
}

/// Wait `delay`, then try to connect to `target`. Returns whether it worked.
pub async fn probe(target: SocketAddr, delay: Duration, connect_timeout: Duration) -> bool {
    time::sleep(delay).await;

    match time::timeout(connect_timeout, TcpStream::connect(target)).await {
        Ok(Ok(_)) => {
            tracing::info!(port = target.port(), "Self-check passed, listener is accepting connections");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(port = target.port(), error = %e, "Self-check failed, port is not listening");
            false
        }
        Err(_) => {
            tracing::warn!(port = target.port(), timeout = ?connect_timeout, "Self-check timed out");
            false
        }
    }
}

/// Fire-and-forget probe of the listener bound at `local`.
pub fn spawn(local: SocketAddr, config: &LifecycleConfig) -> JoinHandle<bool> {
    let target = probe_target(local);
    let delay = Duration::from_millis(config.self_check_delay_ms);
    let connect_timeout = Duration::from_secs(config.self_check_timeout_secs);
    tokio::spawn(probe(target, delay, connect_timeout))
}
