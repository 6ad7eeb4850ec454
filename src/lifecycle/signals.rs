//! OS signal handling.
//!
//! SIGINT and SIGTERM set the shutdown flag instead of exiting the process.
//! A second signal forces shutdown: the drain stops waiting for in-flight
//! connections.

use std::io;

use crate::lifecycle::Shutdown;

/// Register the signal handlers and spawn the task that listens on them.
///
/// Registration happens before this returns, so a signal arriving right
/// after startup is never missed.
#[cfg(unix)]
pub fn install(shutdown: Shutdown) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = interrupt.recv() => "SIGINT",
                Some(()) = terminate.recv() => "SIGTERM",
                else => break,
            };
            on_signal(&shutdown, name);
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn install(shutdown: Shutdown) -> io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            on_signal(&shutdown, "ctrl-c");
        }
    });
    Ok(())
}

fn on_signal(shutdown: &Shutdown, name: &str) {
    if shutdown.trigger() {
        tracing::info!(signal = name, "Shutdown signal received, no longer accepting connections");
    } else if shutdown.force() {
        tracing::warn!(signal = name, "Second signal received, abandoning in-flight connections");
    } else {
        tracing::warn!(signal = name, "Shutdown already forced");
    }
}
