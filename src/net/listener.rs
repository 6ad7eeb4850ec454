//! TCP listener with a cancellable accept.
//!
//! # Responsibilities
//! - Bind the configured address with `SO_REUSEADDR`
//! - Accept connections with a bounded wait, so callers can check a
//!   shutdown flag between attempts
//! - Release the socket when dropped

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};

const BACKLOG: u32 = 1024;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// A listening socket whose accept gives up after `poll_interval`.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    poll_interval: Duration,
}

impl Listener {
    /// Bind `addr` with address reuse enabled.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(addr: SocketAddr, poll_interval: Duration) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind { addr, source };

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;

        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let inner = socket.listen(BACKLOG).map_err(bind_err)?;

        let local_addr = inner.local_addr().map_err(bind_err)?;
        tracing::info!(
            address = %local_addr,
            poll_interval = ?poll_interval,
            "Listener bound"
        );

        Ok(Self {
            inner,
            poll_interval,
        })
    }

    /// Wait at most one poll interval for a connection.
    ///
    /// `Ok(None)` means the interval elapsed with nothing pending.
    pub async fn poll_accept(&self) -> Result<Option<(TcpStream, SocketAddr)>, ListenerError> {
        match tokio::time::timeout(self.poll_interval, self.inner.accept()).await {
            Ok(Ok((stream, peer))) => {
                tracing::debug!(peer_addr = %peer, "Connection accepted");
                Ok(Some((stream, peer)))
            }
            Ok(Err(e)) => Err(ListenerError::Accept(e)),
            Err(_) => Ok(None),
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn poll_accept_times_out_when_idle() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), Duration::from_millis(50)).unwrap();
        let start = Instant::now();
        assert!(listener.poll_accept().await.unwrap().is_none());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn poll_accept_returns_pending_connection() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), Duration::from_secs(5)).unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (_, peer) = listener.poll_accept().await.unwrap().expect("connection");
        let client = client.await.unwrap();
        assert_eq!(peer, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let first = Listener::bind("127.0.0.1:0".parse().unwrap(), Duration::from_millis(50)).unwrap();
        let addr = first.local_addr().unwrap();

        match Listener::bind(addr, Duration::from_millis(50)) {
            Err(ListenerError::Bind { addr: failed, .. }) => assert_eq!(failed, addr),
            other => panic!("expected bind error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn port_is_released_on_drop() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), Duration::from_millis(50)).unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(TcpStream::connect(addr).await.is_err());
        Listener::bind(addr, Duration::from_millis(50)).unwrap();
    }
}
