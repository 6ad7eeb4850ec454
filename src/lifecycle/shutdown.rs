//! Shutdown coordination for the relay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Process-wide shutdown flag.
///
/// Set once, never cleared. The accept loop polls [`Shutdown::is_triggered`];
/// long-lived tasks await [`Shutdown::wait`]. Clones share the same flag.
///
/// A second stage, [`Shutdown::force`], tells the drain to stop waiting for
/// in-flight connections.
#[derive(Debug, Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    flag: AtomicBool,
    tx: watch::Sender<bool>,
    forced: AtomicBool,
    force_tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new, untriggered shutdown flag.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        let (force_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                flag: AtomicBool::new(false),
                tx,
                forced: AtomicBool::new(false),
                force_tx,
            }),
        }
    }

    /// Set the flag. Returns `true` only for the call that actually set it.
    pub fn trigger(&self) -> bool {
        if self.inner.flag.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.tx.send_replace(true);
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolve once the flag is set. Returns immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.inner.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Skip the drain. Also sets the shutdown flag. Returns `true` only for
    /// the call that actually forced.
    pub fn force(&self) -> bool {
        self.trigger();
        if self.inner.forced.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.force_tx.send_replace(true);
        true
    }

    pub fn is_forced(&self) -> bool {
        self.inner.forced.load(Ordering::SeqCst)
    }

    /// Resolve once [`Shutdown::force`] has been called.
    pub async fn wait_forced(&self) {
        let mut rx = self.inner.force_tx.subscribe();
        let _ = rx.wait_for(|forced| *forced).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
